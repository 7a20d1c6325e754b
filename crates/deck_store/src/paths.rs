//! Package path arithmetic for relationship targets

/// Directory portion of a part path ("" for root-level parts)
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(i) => &path[..i],
        None => "",
    }
}

/// Resolve a (possibly `../`-relative) relationship target against the
/// directory of its owner part, yielding a normalized package path.
pub fn resolve_target(owner_path: &str, target: &str) -> String {
    if let Some(stripped) = target.strip_prefix('/') {
        return stripped.to_string();
    }
    let mut segments: Vec<&str> = parent_dir(owner_path)
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    for seg in target.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Relative path from an owner part's directory to a target package path,
/// as written in a `.rels` file.
pub fn relative_target(owner_path: &str, target_path: &str) -> String {
    let from: Vec<&str> = parent_dir(owner_path)
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    let to: Vec<&str> = target_path.split('/').filter(|s| !s.is_empty()).collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out: Vec<String> = Vec::new();
    for _ in common..from.len() {
        out.push("..".to_string());
    }
    for seg in &to[common..] {
        out.push(seg.to_string());
    }
    out.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_sibling_dir() {
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "../media/image1.png"),
            "ppt/media/image1.png"
        );
        assert_eq!(
            resolve_target("ppt/presentation.xml", "slides/slide1.xml"),
            "ppt/slides/slide1.xml"
        );
    }

    #[test]
    fn test_resolve_absolute() {
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "/ppt/media/image1.png"),
            "ppt/media/image1.png"
        );
    }

    #[test]
    fn test_relative_roundtrip() {
        let owner = "ppt/slides/slide1.xml";
        let target = "ppt/media/image1.png";
        let rel = relative_target(owner, target);
        assert_eq!(rel, "../media/image1.png");
        assert_eq!(resolve_target(owner, &rel), target);
    }

    #[test]
    fn test_relative_same_dir() {
        assert_eq!(
            relative_target("ppt/presentation.xml", "ppt/presProps.xml"),
            "presProps.xml"
        );
    }
}
