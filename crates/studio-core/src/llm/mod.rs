mod traits;
mod gemini;

pub use traits::*;
pub use gemini::{parse_sse_payload, GeminiClient};
