use super::*;

#[test]
fn disabled_returns_path_unchanged() {
    let ob = PathObfuscator::disabled();
    assert_eq!(ob.obfuscate("/media/videos/Studio Name/scene.mp4"), "/media/videos/Studio Name/scene.mp4");
}

#[test]
fn empty_path_returns_unchanged_even_when_enabled() {
    let ob = PathObfuscator::new(true);
    assert_eq!(ob.obfuscate(""), "");
}

#[test]
fn obfuscates_posix_path_preserving_extension_and_leading_slash() {
    let ob = PathObfuscator::new(true);
    let out = ob.obfuscate("/media/videos/Studio Name/scene-title.mp4");
    assert!(out.starts_with('/'));
    assert!(out.ends_with(".mp4"));
    assert_eq!(out.matches('/').count(), 3);
}

#[test]
fn obfuscates_windows_path_with_backslash_separator() {
    let ob = PathObfuscator::new(true);
    let out = ob.obfuscate("C:\\Media\\Studio\\scene.mkv");
    assert!(out.contains('\\'));
    assert!(out.ends_with(".mkv"));
}

#[test]
fn same_segment_maps_to_same_word_within_instance() {
    let ob = PathObfuscator::new(true);
    let a = ob.obfuscate("/media/Studio/one.mp4");
    let b = ob.obfuscate("/media/Studio/two.mp4");
    let a_studio = a.split('/').nth(2).unwrap();
    let b_studio = b.split('/').nth(2).unwrap();
    assert_eq!(a_studio, b_studio);
}

#[test]
fn distinct_segments_resolve_collisions_with_numeric_suffix() {
    let ob = PathObfuscator::new(true);
    // Force many distinct top-level segments to exercise the collision path
    // without depending on which hash bucket any one string lands in.
    let mut words = std::collections::HashSet::new();
    for i in 0..200 {
        let out = ob.obfuscate(&format!("/segment-{i}/file.txt"));
        let seg = out.split('/').nth(1).unwrap().to_string();
        assert!(words.insert(seg), "obfuscator produced a duplicate word for distinct segments");
    }
}

#[test]
fn relative_path_has_no_leading_separator() {
    let ob = PathObfuscator::new(true);
    let out = ob.obfuscate("Studio/scene.mp4");
    assert!(!out.starts_with('/'));
}
