use crate::reconnect::ReconnectPolicy;

#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    /// Shared application name; channels live at `/{app_name}/draw` and `/{app_name}/chat`.
    pub app_name: String,
    /// Key the session token is stored under.
    pub token_key: String,
    pub login_route: String,
    pub reconnect: ReconnectPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            app_name: "doodleguess".to_string(),
            token_key: "token".to_string(),
            login_route: "/login.html".to_string(),
            reconnect: ReconnectPolicy::ReturnToLogin,
        }
    }
}
