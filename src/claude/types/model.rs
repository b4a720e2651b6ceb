pub const CLAUDE_3_5_SONNET: &str = "claude-3-5-sonnet-20240620";
pub const CLAUDE_3_7_SONNET: &str = "claude-3-7-sonnet-20240307";

/// Whether the upstream accepts the extended-thinking flag for `model`.
pub fn supports_extended_thinking(model: &str) -> bool {
    model == CLAUDE_3_7_SONNET
}
