//! Tolerant JSON extraction from model replies

use log::error;
use serde_json::Value;

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Max characters of offending content kept in errors and logs
pub const PREVIEW_CHARS: usize = 500;

/// Interior of the first fenced block, preferring a ```json block.
/// Text without any fence is returned trimmed.
pub fn strip_code_fence(content: &str) -> &str
{   let inner = if let Some(start) = content.find(JSON_FENCE)
    {   let rest = &content[start + JSON_FENCE.len()..];
        until_fence(rest)
    } else if let Some(start) = content.find(FENCE)
    {   let rest = &content[start + FENCE.len()..];
        until_fence(rest)
    } else
    {   content
    };
    inner.trim()
}

fn until_fence(rest: &str) -> &str
{   match rest.find(FENCE)
    {   Some(end) => &rest[..end]
      , None => rest
    }
}

/// First `PREVIEW_CHARS` characters, cut on a char boundary
pub fn preview(content: &str) -> String
{   content.chars().take(PREVIEW_CHARS).collect()
}

/// Extract and parse the JSON payload of a reply on behalf of `agent`.
pub fn parse_json_response(
  agent: &str
, content: &str
) -> crate::error::Result<Value>
{   let payload = strip_code_fence(content);
    serde_json::from_str(payload).map_err(|e| {
      let preview = preview(payload);
      error!("[{}] Failed to parse JSON: {}", agent, e);
      error!("[{}] Content: {}", agent, preview);
      crate::error::Error::InvalidResponse
      {   agent: agent.to_string()
        , preview
      }
    })
}
