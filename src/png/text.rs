use super::*;

/// Textual data: a keyword and its text, separated by a single null byte.
///
/// Both are Latin-1. Normally the keyword length should be 1-79 bytes.
///
/// Spec: [tEXt](https://www.w3.org/TR/png/#11tEXt)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct tEXt<'a> {
  pub keyword: &'a str,
  pub text: &'a str,
}
impl tEXt<'_> {
  /// The chunk payload.
  pub fn to_payload(&self) -> ApngResult<Vec<u8>> {
    let mut out = Vec::new();
    out.try_reserve_exact(self.keyword.len() + 1 + self.text.len())?;
    out.extend_from_slice(self.keyword.as_bytes());
    out.push(0);
    out.extend_from_slice(self.text.as_bytes());
    Ok(out)
  }

  /// Splits a raw payload back into keyword and text.
  #[must_use]
  pub fn parse_payload(data: &[u8]) -> Option<(&[u8], &[u8])> {
    let nul = data.iter().position(|&b| b == 0)?;
    Some((&data[..nul], &data[nul + 1..]))
  }
}

#[test]
fn test_text_payload() {
  let t = tEXt { keyword: "Software", text: "apngkit" };
  let payload = t.to_payload().unwrap();
  assert_eq!(payload, b"Software\0apngkit");
  assert_eq!(tEXt::parse_payload(&payload), Some((&b"Software"[..], &b"apngkit"[..])));
}
