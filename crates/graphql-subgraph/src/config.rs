#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FederationConfig {
    /// Expose snake case attributes as camel case fields: `user_id` becomes `userId`.
    pub auto_camel_case: bool,
    /// Whether the subscription root type is part of the SDL served by `_service`.
    pub include_subscription: bool,
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            auto_camel_case: true,
            include_subscription: true,
        }
    }
}
