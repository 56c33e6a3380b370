// RFC 8288 `Link` header parsing, just enough for GitHub pagination

/// Find the URL tagged `rel="next"` in a `Link` header value
///
/// GitHub sends something like:
/// `<https://api.github.com/user/1/starred?page=2>; rel="next", <https://api.github.com/user/1/starred?page=9>; rel="last"`
pub fn next_page_url(header: &str) -> Option<String> {
    find_rel(header, "next")
}

fn find_rel(header: &str, wanted: &str) -> Option<String> {
    let mut rest = header;

    // URLs may contain ',' and ';', so the <...> target is cut out first and
    // only the text after it is split into params
    loop {
        let open = rest.find('<')?;
        let target = &rest[open + 1..];
        let close = target.find('>')?;
        let url = &target[..close];

        let after = &target[close + 1..];
        let end = params_end(after);
        let params = &after[..end];
        rest = &after[end..];

        if params.split(';').any(|param| rel_matches(param, wanted)) {
            return Some(url.to_string());
        }
    }
}

/// Index of the comma that ends this link's params, skipping quoted values
fn params_end(params: &str) -> usize {
    let mut quoted = false;
    for (i, c) in params.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ',' if !quoted => return i,
            _ => {}
        }
    }
    params.len()
}

fn rel_matches(param: &str, wanted: &str) -> bool {
    let Some((key, value)) = param.split_once('=') else {
        return false;
    };
    if !key.trim().eq_ignore_ascii_case("rel") {
        return false;
    }
    // rel may hold several space separated relation types
    value
        .trim()
        .trim_matches('"')
        .split_whitespace()
        .any(|rel| rel.eq_ignore_ascii_case(wanted))
}
