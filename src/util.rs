//! Small text helpers used across modules.

/// Named character references the trivia API is known to emit.
const NAMED_ENTITIES: &[(&str, char)] = &[
  ("amp", '&'), ("lt", '<'), ("gt", '>'), ("quot", '"'), ("apos", '\''),
  ("nbsp", '\u{00A0}'), ("shy", '\u{00AD}'),
  ("lsquo", '\u{2018}'), ("rsquo", '\u{2019}'), ("ldquo", '\u{201C}'), ("rdquo", '\u{201D}'),
  ("hellip", '\u{2026}'), ("ndash", '\u{2013}'), ("mdash", '\u{2014}'),
  ("deg", '\u{00B0}'), ("pi", '\u{03C0}'), ("times", '\u{00D7}'), ("divide", '\u{00F7}'),
  ("laquo", '\u{00AB}'), ("raquo", '\u{00BB}'), ("euro", '\u{20AC}'), ("pound", '\u{00A3}'),
  ("copy", '\u{00A9}'), ("reg", '\u{00AE}'), ("trade", '\u{2122}'), ("prime", '\u{2032}'),
  ("Prime", '\u{2033}'), ("sup2", '\u{00B2}'), ("sup3", '\u{00B3}'), ("frac12", '\u{00BD}'),
  ("aacute", 'á'), ("Aacute", 'Á'), ("agrave", 'à'), ("acirc", 'â'), ("atilde", 'ã'),
  ("auml", 'ä'), ("Auml", 'Ä'), ("aring", 'å'), ("Aring", 'Å'), ("aelig", 'æ'),
  ("ccedil", 'ç'), ("Ccedil", 'Ç'),
  ("eacute", 'é'), ("Eacute", 'É'), ("egrave", 'è'), ("ecirc", 'ê'), ("euml", 'ë'),
  ("iacute", 'í'), ("Iacute", 'Í'), ("igrave", 'ì'), ("icirc", 'î'), ("iuml", 'ï'),
  ("ntilde", 'ñ'), ("Ntilde", 'Ñ'),
  ("oacute", 'ó'), ("Oacute", 'Ó'), ("ograve", 'ò'), ("ocirc", 'ô'), ("otilde", 'õ'),
  ("ouml", 'ö'), ("Ouml", 'Ö'), ("oslash", 'ø'), ("Oslash", 'Ø'),
  ("uacute", 'ú'), ("Uacute", 'Ú'), ("ugrave", 'ù'), ("ucirc", 'û'), ("uuml", 'ü'), ("Uuml", 'Ü'),
  ("yacute", 'ý'), ("szlig", 'ß'),
];

// Longest name in NAMED_ENTITIES plus slack for numeric forms like "#x1F600".
const MAX_REFERENCE_LEN: usize = 10;

/// Decode HTML character references (`&quot;`, `&#039;`, `&#x27;` ...).
/// Unknown or malformed references are copied through unchanged.
pub fn decode_entities(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  let mut rest = s;

  while let Some(amp) = rest.find('&') {
    out.push_str(&rest[..amp]);
    let tail = &rest[amp + 1..];

    let decoded = tail
      .char_indices()
      .take(MAX_REFERENCE_LEN + 1)
      .find(|(_, c)| *c == ';')
      .and_then(|(semi, _)| resolve_reference(&tail[..semi]).map(|ch| (ch, semi)));

    match decoded {
      Some((ch, semi)) => {
        out.push(ch);
        rest = &tail[semi + 1..];
      }
      None => {
        out.push('&');
        rest = tail;
      }
    }
  }
  out.push_str(rest);
  out
}

fn resolve_reference(name: &str) -> Option<char> {
  if let Some(num) = name.strip_prefix('#') {
    let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
      Some(hex) => u32::from_str_radix(hex, 16).ok()?,
      None => num.parse::<u32>().ok()?,
    };
    return char::from_u32(code);
  }
  NAMED_ENTITIES.iter().find(|(n, _)| *n == name).map(|(_, c)| *c)
}

/// Escape text for embedding in HTML element content or attribute values.
pub fn escape_html(s: &str) -> String {
  let mut out = String::with_capacity(s.len() + 8);
  for ch in s.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      _ => out.push(ch),
    }
  }
  out
}

/// Log-safe truncation for large strings. Cuts on a char boundary.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut end = max;
  while !s.is_char_boundary(end) {
    end -= 1;
  }
  format!("{}… ({} bytes total)", &s[..end], s.len())
}
