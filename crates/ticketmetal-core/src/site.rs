//! Vendor labels for external purchase links.

use url::Url;

/// Label used when a purchase link cannot be parsed.
pub const GENERIC_SITE_LABEL: &str = "EVENTO EXTERNO";

/// Known ticketing vendors, keyed by lowercase host or first host label.
const KNOWN_VENDORS: &[(&str, &str)] = &[
  ("sympla", "SYMPLA"),
  ("eventbrite", "EVENTBRITE"),
  ("ingresse", "INGRESSE"),
  ("ticketmaster", "TICKETMASTER"),
  ("eventim", "EVENTIM"),
  ("blueticket", "BLUETICKET"),
  ("bilheteriadigital", "BILHETERIA DIGITAL"),
  ("clubedoingresso", "CLUBE DO INGRESSO"),
  ("ingressorapido", "INGRESSO RÁPIDO"),
  ("ticket360", "TICKET360"),
  ("totalacesso", "TOTAL ACESSO"),
  ("uhuu", "UHUU"),
  ("shotgun", "SHOTGUN"),
  ("outgo", "OUTGO"),
  ("q2ingressos", "Q2 INGRESSOS"),
  ("ticketsforfun", "TICKETS FOR FUN"),
  ("guicheweb", "GUICHÊ WEB"),
];

fn lookup(key: &str) -> Option<&'static str> {
  KNOWN_VENDORS
    .iter()
    .find(|(k, _)| k.eq_ignore_ascii_case(key))
    .map(|(_, label)| *label)
}

/// A human-readable vendor label for `url`.
///
/// `https://www.sympla.com.br/evento/123` → `SYMPLA`; unknown hosts yield
/// their first label upper-cased; unparseable input yields
/// [`GENERIC_SITE_LABEL`].
pub fn resolve_site_name(url: &str) -> String {
  let Some(host) = Url::parse(url.trim())
    .ok()
    .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
  else {
    return GENERIC_SITE_LABEL.to_string();
  };

  let host = host.strip_prefix("www.").unwrap_or(&host);
  let first = host.split('.').next().unwrap_or(host);
  if first.is_empty() {
    return GENERIC_SITE_LABEL.to_string();
  }

  lookup(host)
    .or_else(|| lookup(first))
    .map(str::to_string)
    .unwrap_or_else(|| first.to_uppercase())
}
