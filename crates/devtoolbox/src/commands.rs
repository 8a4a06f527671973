//! CLI command runners.
//!
//! Each `run_*` function backs one `dtb` subcommand. Results go to stdout
//! as plain text, or as JSON when `json` is set; diagnostics go through
//! `tracing` to stderr.

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use devtoolbox_core::json::Indent;
use devtoolbox_core::lorem::{self, GenerationRequest};
use devtoolbox_core::regex_eval::{self, RegexFlags};
use devtoolbox_core::services::{NewBookmark, NewFeedback, NewToolRequest};
use devtoolbox_core::timestamp::{self, TimeUnit, TimestampView};
use devtoolbox_core::{base64_codec, html_entities, json, jsx, yaml};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncReadExt;

use crate::app::AppContext;
use crate::config::FaviconConfig;
use crate::tool_state::{Base64State, JsonState, LoremState, RegexState};
use crate::files::LatestRead;
use crate::{favicon, files};

/// Where a command's text input comes from.
///
/// File reads go through a [`LatestRead`] shared by every input of the
/// process, so a read that finishes after a newer one started is rejected.
#[derive(Debug, Clone, Default)]
pub struct Input {
    pub text: Option<String>,
    pub file: Option<PathBuf>,
    pub reads: Arc<LatestRead>,
}

fn superseded(path: &Path) -> anyhow::Error {
    anyhow!("read of {} was superseded by a newer one", path.display())
}

impl Input {
    /// The positional argument, else the `--input` file, else stdin.
    pub async fn read(self) -> Result<String> {
        if let Some(text) = self.text {
            return Ok(text);
        }
        if let Some(path) = self.file {
            return self
                .reads
                .load_text(&path)
                .await?
                .ok_or_else(|| superseded(&path));
        }
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("Failed to read stdin")?;
        Ok(buf)
    }

    /// The `--input` file as a `data:` URI. Only files carry a MIME type.
    pub async fn read_data_uri(self) -> Result<String> {
        let Some(path) = self.file else {
            bail!("--data-uri needs a file given with --input");
        };
        self.reads
            .load_data_uri(&path)
            .await?
            .ok_or_else(|| superseded(&path))
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_output(output: &str, as_json: bool) -> Result<()> {
    if as_json {
        print_json(&serde_json::json!({ "output": output }))
    } else {
        println!("{}", output);
        Ok(())
    }
}

fn current_uid(app: &AppContext) -> Result<String> {
    match app.auth.current_user() {
        Some(user) => Ok(user.uid),
        None => bail!("not signed in"),
    }
}

// ============ init / tools ============

pub fn run_tools(app: &AppContext, as_json: bool) -> Result<()> {
    if as_json {
        return print_json(&app.tools.infos());
    }
    println!("{:<20} DESCRIPTION", "TOOL");
    for t in app.tools.tools() {
        println!("{:<20} {}", t.name(), t.description());
    }
    Ok(())
}

// ============ lorem ============

/// Command-line overrides for a generation request.
#[derive(Debug, Clone, Default)]
pub struct LoremArgs {
    pub unit: Option<lorem::Unit>,
    pub count: Option<usize>,
    pub min_words: Option<usize>,
    pub max_words: Option<usize>,
    pub min_sentences: Option<usize>,
    pub max_sentences: Option<usize>,
    pub canonical: Option<bool>,
    pub markup: Option<bool>,
    pub seed: Option<u64>,
    pub stats: bool,
}

impl LoremArgs {
    fn apply(&self, base: &GenerationRequest) -> GenerationRequest {
        let mut req = base.clone();
        if let Some(unit) = self.unit {
            req.unit = unit;
        }
        req.count = self.count.unwrap_or(req.count);
        req.min_words_per_sentence = self.min_words.unwrap_or(req.min_words_per_sentence);
        req.max_words_per_sentence = self.max_words.unwrap_or(req.max_words_per_sentence);
        req.min_sentences_per_paragraph = self.min_sentences.unwrap_or(req.min_sentences_per_paragraph);
        req.max_sentences_per_paragraph = self.max_sentences.unwrap_or(req.max_sentences_per_paragraph);
        req.start_with_canonical_opening = self.canonical.unwrap_or(req.start_with_canonical_opening);
        req.wrap_in_markup_tags = self.markup.unwrap_or(req.wrap_in_markup_tags);
        req
    }
}

/// Generate placeholder text. Unspecified options fall back to the last
/// request made, then to the `[lorem]` config.
pub async fn run_lorem(app: &AppContext, args: LoremArgs, as_json: bool) -> Result<()> {
    let base = match app.state.find::<LoremState>().await {
        Some(saved) => saved.request,
        None => app.config.lorem.clone(),
    };
    let req = args.apply(&base);

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let text = lorem::generate(&req, &mut rng)?;
    app.state.save(&LoremState { request: req }).await?;

    let stats = lorem::text_stats(&text);
    if as_json {
        return print_json(&serde_json::json!({ "text": text, "stats": stats }));
    }
    println!("{}", text);
    if args.stats {
        println!();
        println!(
            "{} characters, {} words, {} sentences, {} paragraphs",
            stats.characters, stats.words, stats.sentences, stats.paragraphs
        );
    }
    Ok(())
}

// ============ base64 ============

/// `data_uri` encodes the `--input` file as a `data:` URI instead of text.
pub async fn run_base64(
    app: &AppContext,
    decode: bool,
    url_safe: Option<bool>,
    data_uri: bool,
    input: Input,
    as_json: bool,
) -> Result<()> {
    if data_uri {
        if decode {
            bail!("--data-uri only applies to encoding");
        }
        return print_output(&input.read_data_uri().await?, as_json);
    }

    let mut state = app.state.load::<Base64State>().await;
    if let Some(flag) = url_safe {
        state.url_safe = flag;
    }
    let text = input.read().await?;
    let output = if decode {
        base64_codec::decode(&text, state.url_safe)?
    } else {
        // Trailing newline from stdin or a file is not part of the payload.
        base64_codec::encode(text.strip_suffix('\n').unwrap_or(&text), state.url_safe)
    };
    app.state.save(&state).await?;
    print_output(&output, as_json)
}

// ============ json / yaml ============

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonAction {
    Format,
    Minify,
    Validate,
}

pub async fn run_json(
    app: &AppContext,
    action: JsonAction,
    indent: Option<Indent>,
    input: Input,
    as_json: bool,
) -> Result<()> {
    let text = input.read().await?;
    match action {
        JsonAction::Format => {
            let mut state = app.state.load::<JsonState>().await;
            state.indent = indent.unwrap_or(state.indent);
            let output = json::format(&text, state.indent)?;
            app.state.save(&state).await?;
            print_output(&output, as_json)
        }
        JsonAction::Minify => print_output(&json::minify(&text)?, as_json),
        JsonAction::Validate => {
            let summary = json::validate(&text)?;
            if as_json {
                return print_json(&summary);
            }
            println!(
                "Valid JSON: {} with {} entries, depth {}",
                summary.kind, summary.entries, summary.depth
            );
            Ok(())
        }
    }
}

pub async fn run_yaml(
    app: &AppContext,
    to_json: bool,
    indent: Option<Indent>,
    input: Input,
    as_json: bool,
) -> Result<()> {
    let text = input.read().await?;
    let output = if to_json {
        let indent = match indent {
            Some(indent) => indent,
            None => app.state.load::<JsonState>().await.indent,
        };
        yaml::yaml_to_json(&text, indent)?
    } else {
        yaml::json_to_yaml(&text)?
    };
    print_output(output.trim_end(), as_json)
}

// ============ html ============

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlAction {
    Escape,
    Unescape,
    ToJsx { component: Option<String> },
}

pub async fn run_html(action: HtmlAction, input: Input, as_json: bool) -> Result<()> {
    let text = input.read().await?;
    let output = match action {
        HtmlAction::Escape => html_entities::escape(&text),
        HtmlAction::Unescape => html_entities::unescape(&text)?,
        HtmlAction::ToJsx { component } => jsx::html_to_jsx(&text, component.as_deref())?,
    };
    print_output(&output, as_json)
}

// ============ regex ============

pub async fn run_regex(
    app: &AppContext,
    pattern: String,
    flags: Option<String>,
    replacement: Option<String>,
    input: Input,
    as_json: bool,
) -> Result<()> {
    let saved = app.state.load::<RegexState>().await;
    let flags: RegexFlags = match flags {
        Some(raw) => raw.parse()?,
        None if saved.pattern.is_empty() => RegexFlags {
            global: true,
            ..Default::default()
        },
        None => saved.flags,
    };
    let text = input.read().await?;

    let state = RegexState {
        pattern: pattern.clone(),
        flags,
    };

    if let Some(replacement) = replacement {
        let output = regex_eval::replace(&pattern, flags, &text, &replacement)?;
        app.state.save(&state).await?;
        return print_output(&output, as_json);
    }

    let evaluation = regex_eval::evaluate(&pattern, flags, &text)?;
    app.state.save(&state).await?;
    if as_json {
        return print_json(&evaluation);
    }

    if evaluation.matches.is_empty() {
        println!("No matches for /{}/{}", pattern, flags);
        return Ok(());
    }
    println!(
        "{} match{} for /{}/{}{}",
        evaluation.matches.len(),
        if evaluation.matches.len() == 1 { "" } else { "es" },
        pattern,
        flags,
        if evaluation.truncated { " (truncated)" } else { "" }
    );
    for (i, m) in evaluation.matches.iter().enumerate() {
        println!("  [{}] {}..{}  {:?}", i + 1, m.start, m.end, m.text);
        for (g, group) in m.groups.iter().enumerate() {
            match group {
                Some(text) => println!("      ${} = {:?}", g + 1, text),
                None => println!("      ${} = (unmatched)", g + 1),
            }
        }
    }
    Ok(())
}

// ============ timestamp ============

/// Convert `value` (a Unix timestamp or a date string); no value means now.
pub fn run_timestamp(value: Option<String>, unit: Option<TimeUnit>, as_json: bool) -> Result<()> {
    let now = Utc::now();
    let view = match value.as_deref().map(str::trim) {
        None | Some("") => timestamp::from_unix(now.timestamp(), Some(TimeUnit::Seconds), now)?,
        Some(raw) => match raw.parse::<i64>() {
            Ok(n) => timestamp::from_unix(n, unit, now)?,
            Err(_) => timestamp::parse_date(raw, now)?,
        },
    };
    if as_json {
        return print_json(&view);
    }
    print_timestamp(&view);
    Ok(())
}

fn print_timestamp(view: &TimestampView) {
    println!("Unix (s):   {}", view.unix_seconds);
    println!("Unix (ms):  {}", view.unix_millis);
    println!("ISO 8601:   {}", view.iso8601);
    println!("RFC 2822:   {}", view.rfc2822);
    println!("UTC:        {}", view.utc_human);
    println!("Relative:   {}", view.relative);
}

// ============ favicon ============

/// Render the favicon set for `image` and write `favicons.zip` into
/// `out_dir`. Returns the written path.
pub async fn run_favicon(image: &Path, out_dir: &Path, options: FaviconConfig) -> Result<PathBuf> {
    options.validate()?;
    let source = tokio::fs::read(image)
        .await
        .with_context(|| format!("Failed to read {}", image.display()))?;
    let archive =
        tokio::task::spawn_blocking(move || favicon::generate_zip(&source, &options)).await??;
    let path = files::write_download(out_dir, "favicons.zip", &archive).await?;
    println!("Wrote {} ({} bytes)", path.display(), archive.len());
    Ok(path)
}

// ============ bookmarks / feedback ============

pub async fn run_bookmark_add(app: &AppContext, new: NewBookmark, as_json: bool) -> Result<()> {
    let uid = current_uid(app)?;
    let bookmark = app.bookmarks().add(&uid, new).await?;
    if as_json {
        return print_json(&bookmark);
    }
    println!("Bookmarked {} as {}", bookmark.href, bookmark.id);
    Ok(())
}

pub async fn run_bookmark_list(app: &AppContext, as_json: bool) -> Result<()> {
    let uid = current_uid(app)?;
    let bookmarks = app.bookmarks().list(&uid).await?;
    if as_json {
        return print_json(&bookmarks);
    }
    if bookmarks.is_empty() {
        println!("No bookmarks.");
        return Ok(());
    }
    for b in &bookmarks {
        println!("{:<28} {:<28} {}", b.id, b.title, b.href);
    }
    Ok(())
}

pub async fn run_bookmark_remove(app: &AppContext, id: &str) -> Result<()> {
    let uid = current_uid(app)?;
    app.bookmarks().remove(&uid, id).await?;
    println!("Removed bookmark {}", id);
    Ok(())
}

pub async fn run_feedback(app: &AppContext, new: NewFeedback) -> Result<()> {
    let feedback = app.feedback().submit_feedback(new).await?;
    println!("Thanks! Feedback recorded ({})", feedback.id);
    Ok(())
}

pub async fn run_tool_request(app: &AppContext, new: NewToolRequest) -> Result<()> {
    let request = app.feedback().submit_tool_request(new).await?;
    println!("Request for '{}' recorded ({})", request.tool_name, request.id);
    Ok(())
}
