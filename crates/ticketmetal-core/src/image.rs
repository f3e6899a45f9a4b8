//! Image URL validation and the placeholder fallback.

use url::Url;

/// Shown whenever an event has no usable image.
pub const DEFAULT_EVENT_IMAGE: &str = "https://metalneverdie.com.br/_next/image?url=%2Fheavy-metal-concert-dark.png&w=384&q=75";

/// How many times a single [`ImageSlot`] may swap to the placeholder.
pub const MAX_FALLBACK_SWAPS: u8 = 2;

/// Placeholder strings that upstream serialisers emit for "no image".
const NULLISH: &[&str] = &["null", "undefined", "none"];

/// Whether `candidate` is something a client can display.
///
/// Absolute URLs must use `http` or `https`. Strings that do not parse as an
/// absolute URL are accepted only as `data:` payloads or site-relative paths.
pub fn is_valid_image_url(candidate: Option<&str>) -> bool {
  let Some(trimmed) = candidate.map(str::trim) else {
    return false;
  };
  if trimmed.is_empty()
    || NULLISH.iter().any(|n| trimmed.eq_ignore_ascii_case(n))
  {
    return false;
  }

  match Url::parse(trimmed) {
    Ok(url) => matches!(url.scheme(), "http" | "https"),
    Err(_) => trimmed.starts_with("data:") || trimmed.starts_with('/'),
  }
}

/// `candidate` (trimmed) when valid, otherwise [`DEFAULT_EVENT_IMAGE`].
pub fn resolve_image_url(candidate: Option<&str>) -> String {
  match candidate {
    Some(c) if is_valid_image_url(Some(c)) => c.trim().to_string(),
    _ => DEFAULT_EVENT_IMAGE.to_string(),
  }
}

// ─── Fallback guard ──────────────────────────────────────────────────────────

/// The image currently shown by one view, with a bounded fallback on load
/// errors so a broken placeholder can never cause an endless swap loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSlot {
  src:      String,
  failures: u8,
}

impl ImageSlot {
  pub fn new(candidate: Option<&str>) -> Self {
    Self {
      src:      resolve_image_url(candidate),
      failures: 0,
    }
  }

  pub fn src(&self) -> &str { &self.src }

  pub fn is_placeholder(&self) -> bool { self.src == DEFAULT_EVENT_IMAGE }

  /// Record a failed load. Returns `true` when the slot swapped to the
  /// placeholder.
  pub fn on_load_error(&mut self) -> bool {
    if self.failures >= MAX_FALLBACK_SWAPS || self.is_placeholder() {
      return false;
    }
    self.failures += 1;
    self.src = DEFAULT_EVENT_IMAGE.to_string();
    true
  }
}
