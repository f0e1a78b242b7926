/// A simple ordered header list, cheaper to build than `http::HeaderMap`
/// for the provider layer's mostly-append use.
pub type Headers = Vec<(String, String)>;

pub fn header_set(headers: &mut Headers, name: &str, value: impl Into<String>) {
    header_remove(headers, name);
    headers.push((name.to_string(), value.into()));
}

pub fn header_get<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

pub fn header_remove(headers: &mut Headers, name: &str) {
    headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut headers: Headers = Vec::new();
        header_set(&mut headers, "Authorization", "Bearer abc");
        assert_eq!(header_get(&headers, "authorization"), Some("Bearer abc"));
    }

    #[test]
    fn header_set_replaces_existing_value() {
        let mut headers: Headers = Vec::new();
        header_set(&mut headers, "x-api-key", "one");
        header_set(&mut headers, "x-api-key", "two");
        assert_eq!(headers.len(), 1);
        assert_eq!(header_get(&headers, "x-api-key"), Some("two"));
    }
}
