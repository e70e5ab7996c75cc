use urlencoding::encode;

/// Build a query string, replacing the values of `secret_keys` with `***`.
pub fn redacted_query_string(pairs: &[(String, String)], secret_keys: &[&str]) -> String {
    let mut first = true;
    let mut out = String::new();
    for (k, v) in pairs {
        if !first {
            out.push('&');
        } else {
            first = false;
        }
        out.push_str(&encode(k));
        out.push('=');
        if secret_keys.contains(&k.as_str()) {
            out.push_str("***");
        } else {
            out.push_str(&encode(v));
        }
    }
    out
}
