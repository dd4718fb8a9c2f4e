/// Display title for a node id: `course-progress_v2` -> `Course Progress V2`.
pub fn title_from_id(id: &str) -> String {
    id.replace('-', "_")
        .split('_')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

fn capitalize(chunk: &str) -> String {
    let mut chars = chunk.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
