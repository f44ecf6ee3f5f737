use serde::Serialize;
use uuid::Uuid;

/// Screens a push notification can open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "screen", content = "id", rename_all = "snake_case")]
pub enum Route {
    Home,
    JobBoard,
    Shift(Uuid),
    Booking(Uuid),
    Chat(Uuid),
    Notifications,
}

/// Parse `shield://shifts/<id>`, `/shifts/<id>` and friends. Unknown paths go home.
pub fn parse_deep_link(link: &str) -> Route {
    let path = link.strip_prefix("shield://").unwrap_or(link);
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        ["job-board"] | ["shifts"] => Route::JobBoard,
        ["notifications"] => Route::Notifications,
        ["shifts", id] => parse_id(id).map(Route::Shift).unwrap_or(Route::Home),
        ["bookings", id] => parse_id(id).map(Route::Booking).unwrap_or(Route::Home),
        ["chat", id] => parse_id(id).map(Route::Chat).unwrap_or(Route::Home),
        _ => Route::Home,
    }
}

fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_routes() {
        let id = Uuid::new_v4();
        assert_eq!(parse_deep_link(&format!("/shifts/{}", id)), Route::Shift(id));
        assert_eq!(parse_deep_link(&format!("shield://bookings/{}?tab=chat", id)), Route::Booking(id));
        assert_eq!(parse_deep_link(&format!("/chat/{}/", id)), Route::Chat(id));
        assert_eq!(parse_deep_link("/job-board"), Route::JobBoard);
        assert_eq!(parse_deep_link("shield://notifications#latest"), Route::Notifications);
    }

    #[test]
    fn test_unknown_or_malformed_goes_home() {
        assert_eq!(parse_deep_link(""), Route::Home);
        assert_eq!(parse_deep_link("/"), Route::Home);
        assert_eq!(parse_deep_link("/shifts/not-a-uuid"), Route::Home);
        assert_eq!(parse_deep_link("/settings/profile"), Route::Home);
    }

    #[test]
    fn test_route_serialization() {
        let id = Uuid::nil();
        let value = serde_json::to_value(Route::Shift(id)).unwrap();
        assert_eq!(value["screen"], "shift");
        assert_eq!(value["id"], id.to_string());
        assert_eq!(serde_json::to_value(Route::Home).unwrap()["screen"], "home");
    }
}
