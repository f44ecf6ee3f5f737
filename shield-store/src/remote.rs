//! Client for the Shield web API (assistant and referral endpoints).

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },
}

pub type RemoteResult<T> = Result<T, RemoteError>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub user_role: String,
    pub conversation_history: Vec<ChatTurn>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatReply {
    pub message: String,
    #[serde(default)]
    pub sources: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Referral {
    pub id: String,
    pub referred_email: String,
    pub status: String,
    #[serde(default)]
    pub reward_amount: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReferralSummary {
    pub referral_code: String,
    #[serde(default)]
    pub referrals: Vec<Referral>,
    #[serde(default)]
    pub total_earned: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub display_name: String,
    pub referral_count: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateReferralRequest<'a> {
    referred_email: &'a str,
}

#[derive(Clone)]
pub struct ShieldApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ShieldApiClient {
    pub fn new(base_url: &str) -> RemoteResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("shield/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST /api/ai/chat
    pub async fn chat(&self, request: &ChatRequest) -> RemoteResult<ChatReply> {
        debug!("Forwarding assistant message ({} turns of history)", request.conversation_history.len());
        let response = self.client.post(self.url("/api/ai/chat")).json(request).send().await?;
        decode(response).await
    }

    /// GET /api/referrals
    pub async fn referrals(&self, token: &str) -> RemoteResult<ReferralSummary> {
        let response = self
            .client
            .get(self.url("/api/referrals"))
            .bearer_auth(token)
            .send()
            .await?;
        decode(response).await
    }

    /// POST /api/referrals
    pub async fn create_referral(&self, token: &str, referred_email: &str) -> RemoteResult<Referral> {
        let response = self
            .client
            .post(self.url("/api/referrals"))
            .bearer_auth(token)
            .json(&CreateReferralRequest { referred_email })
            .send()
            .await?;
        decode(response).await
    }

    /// GET /api/referrals/leaderboard
    pub async fn leaderboard(&self, token: &str) -> RemoteResult<Vec<LeaderboardEntry>> {
        let response = self
            .client
            .get(self.url("/api/referrals/leaderboard"))
            .bearer_auth(token)
            .send()
            .await?;
        decode(response).await
    }
}

async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> RemoteResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(RemoteError::Status { status: status.as_u16(), body });
    }
    Ok(response.json::<T>().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{HeaderMap, StatusCode},
        routing::{get, post},
        Json, Router,
    };

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn bearer(headers: &HeaderMap) -> Option<String> {
        headers
            .get("authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::to_string)
    }

    #[tokio::test]
    async fn test_chat_wire_format() {
        let router = Router::new().route(
            "/api/ai/chat",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["userRole"], "personnel");
                assert_eq!(body["conversationHistory"].as_array().unwrap().len(), 1);
                Json(serde_json::json!({
                    "message": format!("echo: {}", body["message"].as_str().unwrap()),
                    "sources": ["handbook"]
                }))
            }),
        );
        let base = serve(router).await;
        let client = ShieldApiClient::new(&format!("{}/", base)).unwrap();

        let reply = client
            .chat(&ChatRequest {
                message: "hi".to_string(),
                user_role: "personnel".to_string(),
                conversation_history: vec![ChatTurn { role: "user".into(), content: "earlier".into() }],
            })
            .await
            .unwrap();

        assert_eq!(reply.message, "echo: hi");
        assert_eq!(reply.sources, Some(vec!["handbook".to_string()]));
    }

    #[tokio::test]
    async fn test_referrals_require_bearer() {
        let router = Router::new()
            .route(
                "/api/referrals",
                get(|headers: HeaderMap| async move {
                    match bearer(&headers).as_deref() {
                        Some("tok") => Ok(Json(serde_json::json!({
                            "referralCode": "SAM-42",
                            "referrals": [{ "id": "r1", "referredEmail": "a@b.com", "status": "pending" }],
                            "totalEarned": 25.0
                        }))),
                        _ => Err(StatusCode::UNAUTHORIZED),
                    }
                }),
            )
            .route(
                "/api/referrals/leaderboard",
                get(|| async {
                    Json(serde_json::json!([{ "rank": 1, "displayName": "Sam", "referralCount": 9 }]))
                }),
            );
        let base = serve(router).await;
        let client = ShieldApiClient::new(&base).unwrap();

        let summary = client.referrals("tok").await.unwrap();
        assert_eq!(summary.referral_code, "SAM-42");
        assert_eq!(summary.referrals.len(), 1);
        assert_eq!(summary.referrals[0].reward_amount, None);

        match client.referrals("wrong").await {
            Err(RemoteError::Status { status, .. }) => assert_eq!(status, 401),
            other => panic!("expected 401, got {:?}", other.map(|s| s.referral_code)),
        }

        let board = client.leaderboard("tok").await.unwrap();
        assert_eq!(board[0].display_name, "Sam");
    }

    #[tokio::test]
    async fn test_create_referral() {
        let router = Router::new().route(
            "/api/referrals",
            post(|Json(body): Json<serde_json::Value>| async move {
                Json(serde_json::json!({
                    "id": "r2",
                    "referredEmail": body["referredEmail"],
                    "status": "sent"
                }))
            }),
        );
        let base = serve(router).await;
        let client = ShieldApiClient::new(&base).unwrap();

        let referral = client.create_referral("tok", "new@guard.co.uk").await.unwrap();
        assert_eq!(referral.referred_email, "new@guard.co.uk");
        assert_eq!(referral.status, "sent");
    }
}
