use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn dtb_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("dtb");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/devtoolbox.sqlite"

[server]
bind = "127.0.0.1:7341"

[lorem]
count = 2

[favicon]
app_name = "Integration"

[auth]
uid = "tester"
"#,
        root.display()
    );

    let config_path = config_dir.join("devtoolbox.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_dtb_with_stdin(config_path: &Path, args: &[&str], stdin: Option<&str>) -> (String, String, bool) {
    let binary = dtb_binary();
    let mut child = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap_or_else(|e| panic!("Failed to run dtb binary at {:?}: {}", binary, e));

    {
        let mut pipe = child.stdin.take().unwrap();
        if let Some(text) = stdin {
            pipe.write_all(text.as_bytes()).unwrap();
        }
    }
    let output = child.wait_with_output().unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn run_dtb(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    run_dtb_with_stdin(config_path, args, None)
}

#[test]
fn test_init_creates_database() {
    let (tmp, config) = setup_test_env();
    let (stdout, stderr, ok) = run_dtb(&config, &["init"]);
    assert!(ok, "init failed: {}", stderr);
    assert!(stdout.contains("Database initialized"));
    assert!(tmp.path().join("data/devtoolbox.sqlite").exists());

    // Idempotent
    let (_, stderr, ok) = run_dtb(&config, &["init"]);
    assert!(ok, "second init failed: {}", stderr);
}

#[test]
fn test_missing_config_uses_defaults() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.toml");
    let (stdout, stderr, ok) = run_dtb(&missing, &["timestamp", "0"]);
    assert!(ok, "timestamp failed: {}", stderr);
    assert!(stdout.contains("1970-01-01T00:00:00.000Z"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("bad.toml");
    fs::write(&path, "[db]\npath = \"x\"\n[lorem]\ncount = 0\n").unwrap();
    let (_, stderr, ok) = run_dtb(&path, &["tools"]);
    assert!(!ok);
    assert!(stderr.contains("lorem"), "stderr: {}", stderr);
}

#[test]
fn test_tools_lists_builtins() {
    let (_tmp, config) = setup_test_env();
    let (stdout, _, ok) = run_dtb(&config, &["tools"]);
    assert!(ok);
    for name in ["base64_encode", "json_format", "regex_test", "lorem_ipsum", "html_to_jsx"] {
        assert!(stdout.contains(name), "missing {} in:\n{}", name, stdout);
    }
}

#[test]
fn test_base64_positional_and_stdin() {
    let (_tmp, config) = setup_test_env();
    let (stdout, _, ok) = run_dtb(&config, &["base64", "encode", "Hello, world!"]);
    assert!(ok);
    assert_eq!(stdout.trim(), "SGVsbG8sIHdvcmxkIQ==");

    let (stdout, _, ok) =
        run_dtb_with_stdin(&config, &["base64", "decode"], Some("SGVsbG8sIHdvcmxkIQ==\n"));
    assert!(ok);
    assert_eq!(stdout.trim(), "Hello, world!");
}

#[test]
fn test_base64_decode_error_exits_nonzero() {
    let (_tmp, config) = setup_test_env();
    let (_, stderr, ok) = run_dtb(&config, &["base64", "decode", "%%%"]);
    assert!(!ok);
    assert!(stderr.contains("Base64"), "stderr: {}", stderr);
}

#[test]
fn test_json_format_remembers_indent() {
    let (_tmp, config) = setup_test_env();
    let (stdout, _, ok) = run_dtb(&config, &["json", "format", "{\"a\":1}", "--indent", "4"]);
    assert!(ok);
    assert_eq!(stdout.trim_end(), "{\n    \"a\": 1\n}");

    // No --indent: the last choice is reused.
    let (stdout, _, ok) = run_dtb(&config, &["json", "format", "{\"b\":2}"]);
    assert!(ok);
    assert_eq!(stdout.trim_end(), "{\n    \"b\": 2\n}");
}

#[test]
fn test_json_from_input_file() {
    let (tmp, config) = setup_test_env();
    let file = tmp.path().join("doc.json");
    fs::write(&file, "{ \"a\" : [ 1, 2 ] }").unwrap();
    let (stdout, _, ok) = run_dtb(&config, &["json", "minify", "--input", file.to_str().unwrap()]);
    assert!(ok);
    assert_eq!(stdout.trim(), "{\"a\":[1,2]}");
}

#[test]
fn test_yaml_round_trip() {
    let (_tmp, config) = setup_test_env();
    let (yaml, _, ok) = run_dtb(&config, &["yaml", "from-json", "{\"name\":\"dtb\",\"tags\":[\"a\"]}"]);
    assert!(ok);
    assert!(yaml.contains("name: dtb"));

    let (json, stderr, ok) = run_dtb_with_stdin(&config, &["yaml", "to-json"], Some(&yaml));
    assert!(ok, "to-json failed: {}", stderr);
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["tags"][0], "a");
}

#[test]
fn test_html_to_jsx() {
    let (_tmp, config) = setup_test_env();
    let (stdout, _, ok) = run_dtb(&config, &["html", "to-jsx", "<label class=\"x\" for=\"n\">N</label><br>"]);
    assert!(ok);
    assert_eq!(stdout.trim(), "<label className=\"x\" htmlFor=\"n\">N</label><br />");
}

#[test]
fn test_regex_lists_matches_as_json() {
    let (_tmp, config) = setup_test_env();
    let (stdout, stderr, ok) = run_dtb(&config, &["--json", "regex", "(\\d+)", "a1 b22 c333"]);
    assert!(ok, "regex failed: {}", stderr);
    let eval: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let matches = eval["matches"].as_array().unwrap();
    assert_eq!(matches.len(), 3);
    assert_eq!(matches[2]["text"], "333");
    assert_eq!(matches[2]["groups"][0], "333");
}

#[test]
fn test_regex_invalid_pattern() {
    let (_tmp, config) = setup_test_env();
    let (_, stderr, ok) = run_dtb(&config, &["regex", "(", "text"]);
    assert!(!ok);
    assert!(stderr.contains("invalid regular expression"));
}

#[test]
fn test_lorem_uses_config_defaults() {
    let (_tmp, config) = setup_test_env();
    let (stdout, _, ok) = run_dtb(&config, &["lorem", "--seed", "3"]);
    assert!(ok);
    let text = stdout.trim_end();
    assert!(text.starts_with("Lorem ipsum dolor sit amet"));
    assert_eq!(text.split("\n\n").count(), 2);
}

#[test]
fn test_lorem_flags_persist_and_reset() {
    let (_tmp, config) = setup_test_env();
    let (stdout, _, ok) = run_dtb(
        &config,
        &["lorem", "--seed", "3", "--canonical", "false", "--markup", "true"],
    );
    assert!(ok);
    assert!(stdout.starts_with("<p>"));
    assert!(!stdout.starts_with("<p>Lorem ipsum dolor sit amet"));

    let (stdout, _, ok) = run_dtb(&config, &["lorem", "--seed", "3"]);
    assert!(ok);
    assert!(stdout.starts_with("<p>"));

    let (stdout, _, ok) = run_dtb(
        &config,
        &["lorem", "--seed", "3", "--canonical", "true", "--markup", "false"],
    );
    assert!(ok);
    assert!(stdout.starts_with("Lorem ipsum dolor sit amet"));
}

#[test]
fn test_lorem_rejects_inverted_bounds() {
    let (_tmp, config) = setup_test_env();
    let (_, stderr, ok) = run_dtb(&config, &["lorem", "--min-words", "10", "--max-words", "2"]);
    assert!(!ok);
    assert!(stderr.contains("words per sentence"));
}

#[test]
fn test_bookmark_lifecycle() {
    let (_tmp, config) = setup_test_env();
    let (stdout, stderr, ok) = run_dtb(
        &config,
        &["bookmark", "add", "--title", "Regex Tester", "--href", "/tools/regex"],
    );
    assert!(ok, "add failed: {}", stderr);
    assert!(stdout.contains("L3Rvb2xzL3JlZ2V4"));

    let (stdout, _, ok) = run_dtb(&config, &["--json", "bookmark", "list"]);
    assert!(ok);
    let list: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(list[0]["title"], "Regex Tester");

    let (_, _, ok) = run_dtb(&config, &["bookmark", "remove", "L3Rvb2xzL3JlZ2V4"]);
    assert!(ok);
    let (stdout, _, _) = run_dtb(&config, &["bookmark", "list"]);
    assert!(stdout.contains("No bookmarks."));
}

#[test]
fn test_feedback_requires_message() {
    let (_tmp, config) = setup_test_env();
    let (_, stderr, ok) = run_dtb(&config, &["feedback", "   "]);
    assert!(!ok);
    assert!(stderr.contains("message is required"));

    let (stdout, _, ok) = run_dtb(&config, &["request-tool", "UUID", "-d", "v4 please"]);
    assert!(ok);
    assert!(stdout.contains("UUID"));
}

#[test]
fn test_favicon_writes_zip_without_overwriting() {
    let (tmp, config) = setup_test_env();
    let image_path = tmp.path().join("logo.png");
    image::RgbaImage::from_pixel(64, 64, image::Rgba([0, 120, 255, 255]))
        .save(&image_path)
        .unwrap();
    let out = tmp.path().join("out");

    for expected in ["favicons.zip", "favicons (1).zip"] {
        let (_, stderr, ok) = run_dtb(
            &config,
            &["favicon", image_path.to_str().unwrap(), "--out", out.to_str().unwrap()],
        );
        assert!(ok, "favicon failed: {}", stderr);
        assert!(out.join(expected).exists(), "missing {}", expected);
    }
}

#[test]
fn test_favicon_rejects_non_hex_theme_color() {
    let (tmp, config) = setup_test_env();
    let image_path = tmp.path().join("logo.png");
    image::RgbaImage::from_pixel(16, 16, image::Rgba([0, 0, 0, 255]))
        .save(&image_path)
        .unwrap();
    let out = tmp.path().join("out");

    let (_, stderr, ok) = run_dtb(
        &config,
        &[
            "favicon",
            image_path.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
            "--theme-color",
            "\"><script>",
        ],
    );
    assert!(!ok);
    assert!(stderr.contains("favicon.theme_color"), "stderr: {}", stderr);
    assert!(!out.join("favicons.zip").exists());
}

#[test]
fn test_base64_data_uri_from_file() {
    let (tmp, config) = setup_test_env();
    let path = tmp.path().join("hello.txt");
    fs::write(&path, "hi").unwrap();

    let (stdout, stderr, ok) = run_dtb(
        &config,
        &["base64", "encode", "--data-uri", "-i", path.to_str().unwrap()],
    );
    assert!(ok, "stderr: {}", stderr);
    assert_eq!(stdout.trim(), "data:text/plain;base64,aGk=");

    let (_, stderr, ok) = run_dtb(&config, &["base64", "encode", "--data-uri", "inline"]);
    assert!(!ok);
    assert!(stderr.contains("--input"));
}
