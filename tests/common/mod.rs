// Integration test helpers
//
// Builds throwaway source trees for pipeline and CLI tests.
#![allow(dead_code)]

use std::fs;
use std::path::Path;

use tempfile::TempDir;

/// Minimal but valid PNG-signature payload used as the fixture image
pub const LOGO_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01,
];

/// Sentinel that must never survive into a bundled artifact
pub const TEST_SCRIPT_SENTINEL: &str = "QUICK_TEST_SENTINEL";

pub const ENTRY_HTML: &str = r#"<!DOCTYPE html>
<html lang="ja">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Memo App</title>
    <link rel="stylesheet" href="styles.css?v=3">
    <link rel="manifest" href="manifest.json">
    <link rel="apple-touch-icon" href="touch-icon.png">
    <!-- scratch note for developers -->
    <!-- @license MIT banner -->
</head>
<body>
    <img src="logo.png" alt="logo">
    <script src="app.js"></script>
    <script src="quick-test.js"></script>
    <script src="https://cdn.example.com/lib.js"></script>
    <script>
    window.addEventListener('load', function () {
        navigator.serviceWorker.register('/sw.js');
    });
    </script>
</body>
</html>
"#;

/// Creates the standard fixture source tree used by most scenarios
pub fn fixture_source_tree() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "index.html", ENTRY_HTML.as_bytes());
    write_file(
        dir.path(),
        "styles.css",
        b"body {\n    background: url(logo.png);\n    margin: 0;\n}\n",
    );
    write_file(dir.path(), "app.js", b"console.log(\"app ready\");\n");
    write_file(
        dir.path(),
        "quick-test.js",
        format!("console.log(\"{}\");\n", TEST_SCRIPT_SENTINEL).as_bytes(),
    );
    write_file(dir.path(), "logo.png", LOGO_PNG);
    dir
}

/// An artifact that satisfies every verifier check
pub fn passing_artifact() -> String {
    concat!(
        "<!DOCTYPE html><html><head>",
        "<meta charset=\"utf-8\">",
        "<meta name=\"viewport\" content=\"width=device-width\">",
        "<title>App</title>",
        "<style>body { background: url(\"data:image/png;base64,AAAA\"); }</style>",
        "</head><body>",
        "<img src=\"data:image/png;base64,BBBB\">",
        "<script>console.log(1);</script>",
        "</body></html>"
    )
    .to_string()
}

pub fn write_file(root: &Path, name: &str, contents: impl AsRef<[u8]>) {
    fs::write(root.join(name), contents).unwrap();
}
