//! Centralized constants.
//! Model ids, endpoints and workspace defaults live here.

// ─── Models ───────────────────────────────────────────────────────────────────

pub mod models {
    pub const GEMINI_FLASH: &str = "gemini-2.5-flash";
    pub const GEMINI_PRO: &str = "gemini-3-pro-preview";

    /// (id, display name, description) for the model picker.
    pub const AVAILABLE: &[(&str, &str, &str)] = &[
        (GEMINI_FLASH, "Gemini 2.5 Flash", "Fast and versatile for most tasks"),
        (GEMINI_PRO, "Gemini 3.0 Pro", "High intelligence for complex reasoning"),
    ];
}

// ─── API Endpoints ────────────────────────────────────────────────────────────

pub mod endpoints {
    pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
    pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
}

// ─── Default Settings ─────────────────────────────────────────────────────────

pub mod defaults {
    pub const MODEL: &str = super::models::GEMINI_FLASH;
    pub const PROMPT_NAME: &str = "Untitled prompt";
    pub const SYSTEM_INSTRUCTION: &str = "You are a helpful, clever, and harmless AI assistant. \
        You respond with clear markdown formatting. If asked to write code, provide it in code \
        blocks with language identifiers.";

    pub const TEMPERATURE: f64 = 1.0;
    pub const TOP_P: f64 = 0.95;
    pub const TOP_K: u32 = 64;
    pub const MAX_OUTPUT_TOKENS: u32 = 8192;

    pub const MIME_OCTET_STREAM: &str = "application/octet-stream";
    /// Stored in place of content that could not be decoded as text.
    pub const BINARY_PLACEHOLDER: &str = "Binary content";
    /// Token left in exported code where the user types their next message.
    pub const NEXT_MESSAGE_PLACEHOLDER: &str = "INSERT_USER_MESSAGE_HERE";
}

// ─── Generation limits (ranges offered by the run-settings controls) ─────────

pub mod limits {
    pub const TEMPERATURE_MIN: f64 = 0.0;
    pub const TEMPERATURE_MAX: f64 = 2.0;
    pub const TOP_P_MIN: f64 = 0.0;
    pub const TOP_P_MAX: f64 = 1.0;
    pub const TOP_K_MIN: u32 = 1;
    pub const TOP_K_MAX: u32 = 100;
    pub const MAX_OUTPUT_TOKENS_MIN: u32 = 100;
    pub const MAX_OUTPUT_TOKENS_MAX: u32 = 8192;
}
