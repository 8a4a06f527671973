//! # DevToolBox CLI (`dtb`)
//!
//! ## Usage
//!
//! ```bash
//! dtb --config ./config/devtoolbox.toml <command>
//! ```
//!
//! Text input comes from the positional argument, `--input <file>`, or
//! stdin, in that order. Pass `--json` for machine-readable output.
//!
//! ## Examples
//!
//! ```bash
//! dtb base64 encode "Hello, world!"
//! dtb json format --input package.json --indent tab
//! cat page.html | dtb html to-jsx --component Page
//! dtb timestamp 1700000000
//! dtb favicon logo.png --out ./public
//! dtb bookmark add --title "Regex Tester" --href /tools/regex
//! ```

use clap::{Parser, Subcommand};
use devtoolbox::app::AppContext;
use devtoolbox::commands::{self, HtmlAction, Input, JsonAction, LoremArgs};
use devtoolbox::config::{self, Config};
use devtoolbox::files::LatestRead;
use devtoolbox::{logging, server};
use devtoolbox_core::json::Indent;
use devtoolbox_core::lorem::Unit;
use devtoolbox_core::services::{NewBookmark, NewFeedback, NewToolRequest};
use devtoolbox_core::timestamp::TimeUnit;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "dtb",
    about = "DevToolBox: encoders, formatters, generators, and testers for everyday development",
    version
)]
struct Cli {
    /// Path to configuration file (TOML). Defaults apply when it is missing.
    #[arg(long, global = true, default_value = "./config/devtoolbox.toml")]
    config: PathBuf,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Text input shared by the converters.
#[derive(clap::Args, Debug)]
struct TextInput {
    /// Input text. Read from --input or stdin when omitted.
    text: Option<String>,

    /// Read input from this file.
    #[arg(long, short = 'i')]
    input: Option<PathBuf>,
}

impl TextInput {
    fn with_loader(self, reads: &Arc<LatestRead>) -> Input {
        Input {
            text: self.text,
            file: self.input,
            reads: reads.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create the SQLite database and tables. Safe to run repeatedly.
    Init,

    /// List every tool the HTTP API serves.
    Tools,

    /// Generate lorem ipsum placeholder text.
    Lorem {
        /// paragraphs, sentences, or words
        #[arg(long, short = 'u')]
        unit: Option<Unit>,
        #[arg(long, short = 'n')]
        count: Option<usize>,
        #[arg(long)]
        min_words: Option<usize>,
        #[arg(long)]
        max_words: Option<usize>,
        #[arg(long)]
        min_sentences: Option<usize>,
        #[arg(long)]
        max_sentences: Option<usize>,
        /// Start with "Lorem ipsum dolor sit amet..." (true or false).
        /// Defaults to the last choice.
        #[arg(long)]
        canonical: Option<bool>,
        /// Wrap output in <p> tags (true or false). Defaults to the last choice.
        #[arg(long)]
        markup: Option<bool>,
        /// Seed for reproducible output.
        #[arg(long)]
        seed: Option<u64>,
        /// Print character, word, sentence, and paragraph counts.
        #[arg(long)]
        stats: bool,
    },

    /// Base64 encode or decode text.
    Base64 {
        #[command(subcommand)]
        action: Base64Action,
    },

    /// Format, minify, or validate JSON.
    Json {
        #[command(subcommand)]
        action: JsonCommand,
    },

    /// Convert between YAML and JSON.
    Yaml {
        #[command(subcommand)]
        action: YamlCommand,
    },

    /// Escape, unescape, or convert HTML.
    Html {
        #[command(subcommand)]
        action: HtmlCommand,
    },

    /// Test a regular expression against text.
    Regex {
        pattern: String,
        #[command(flatten)]
        input: TextInput,
        /// Any of g, i, m, s. Defaults to the last flags used, or "g".
        #[arg(long, short = 'f')]
        flags: Option<String>,
        /// Print the text with matches replaced instead of listing them.
        #[arg(long, short = 'r')]
        replace: Option<String>,
    },

    /// Convert a Unix timestamp or date string. No value means now.
    Timestamp {
        value: Option<String>,
        /// seconds or milliseconds; detected from magnitude when omitted.
        #[arg(long)]
        unit: Option<TimeUnit>,
    },

    /// Generate a favicon set from an image and write favicons.zip.
    Favicon {
        image: PathBuf,
        #[arg(long, short = 'o', default_value = ".")]
        out: PathBuf,
        #[arg(long)]
        app_name: Option<String>,
        #[arg(long)]
        short_name: Option<String>,
        #[arg(long)]
        theme_color: Option<String>,
        #[arg(long)]
        background_color: Option<String>,
    },

    /// Manage bookmarks of the signed-in user.
    Bookmark {
        #[command(subcommand)]
        action: BookmarkAction,
    },

    /// Send feedback.
    Feedback {
        message: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        page: Option<String>,
    },

    /// Ask for a tool that does not exist yet.
    RequestTool {
        name: String,
        #[arg(long, short = 'd')]
        description: String,
        #[arg(long)]
        email: Option<String>,
    },

    /// Start the HTTP API server.
    Serve,
}

#[derive(Subcommand)]
enum Base64Action {
    Encode {
        #[command(flatten)]
        input: TextInput,
        /// Use the URL-safe alphabet (true or false). Defaults to the last choice.
        #[arg(long)]
        url_safe: Option<bool>,
        /// Encode the --input file as a data: URI.
        #[arg(long)]
        data_uri: bool,
    },
    Decode {
        #[command(flatten)]
        input: TextInput,
        #[arg(long)]
        url_safe: Option<bool>,
    },
}

#[derive(Subcommand)]
enum JsonCommand {
    Format {
        #[command(flatten)]
        input: TextInput,
        /// 2, 4, or tab. Defaults to the last indent used.
        #[arg(long)]
        indent: Option<Indent>,
    },
    Minify {
        #[command(flatten)]
        input: TextInput,
    },
    Validate {
        #[command(flatten)]
        input: TextInput,
    },
}

#[derive(Subcommand)]
enum YamlCommand {
    /// YAML in, JSON out.
    ToJson {
        #[command(flatten)]
        input: TextInput,
        #[arg(long)]
        indent: Option<Indent>,
    },
    /// JSON in, YAML out.
    FromJson {
        #[command(flatten)]
        input: TextInput,
    },
}

#[derive(Subcommand)]
enum HtmlCommand {
    Escape {
        #[command(flatten)]
        input: TextInput,
    },
    Unescape {
        #[command(flatten)]
        input: TextInput,
    },
    ToJsx {
        #[command(flatten)]
        input: TextInput,
        /// Wrap the result in a function component with this name.
        #[arg(long)]
        component: Option<String>,
    },
}

#[derive(Subcommand)]
enum BookmarkAction {
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        href: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    List,
    Remove {
        id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_or_minimal(&cli.config)?;
    logging::init(&cfg);
    run(cli.command, cfg, cli.json).await
}

async fn run(command: Commands, cfg: Config, as_json: bool) -> anyhow::Result<()> {
    let db_path = cfg.db.path.clone();
    let favicon_defaults = cfg.favicon.clone();
    // Pure conversions never touch the database, so it is opened on demand.
    let open = move || AppContext::open(cfg);
    let reads = Arc::new(LatestRead::new());

    match command {
        Commands::Init => {
            open().await?;
            println!("Database initialized at {}", db_path.display());
        }
        Commands::Tools => commands::run_tools(&open().await?, as_json)?,
        Commands::Lorem {
            unit,
            count,
            min_words,
            max_words,
            min_sentences,
            max_sentences,
            canonical,
            markup,
            seed,
            stats,
        } => {
            let args = LoremArgs {
                unit,
                count,
                min_words,
                max_words,
                min_sentences,
                max_sentences,
                canonical,
                markup,
                seed,
                stats,
            };
            commands::run_lorem(&open().await?, args, as_json).await?;
        }
        Commands::Base64 { action } => {
            let app = open().await?;
            match action {
                Base64Action::Encode {
                    input,
                    url_safe,
                    data_uri,
                } => {
                    let input = input.with_loader(&reads);
                    commands::run_base64(&app, false, url_safe, data_uri, input, as_json).await?
                }
                Base64Action::Decode { input, url_safe } => {
                    let input = input.with_loader(&reads);
                    commands::run_base64(&app, true, url_safe, false, input, as_json).await?
                }
            }
        }
        Commands::Json { action } => {
            let (action, indent, input) = match action {
                JsonCommand::Format { input, indent } => (JsonAction::Format, indent, input),
                JsonCommand::Minify { input } => (JsonAction::Minify, None, input),
                JsonCommand::Validate { input } => (JsonAction::Validate, None, input),
            };
            let input = input.with_loader(&reads);
            commands::run_json(&open().await?, action, indent, input, as_json).await?;
        }
        Commands::Yaml { action } => {
            let app = open().await?;
            match action {
                YamlCommand::ToJson { input, indent } => {
                    commands::run_yaml(&app, true, indent, input.with_loader(&reads), as_json).await?
                }
                YamlCommand::FromJson { input } => {
                    commands::run_yaml(&app, false, None, input.with_loader(&reads), as_json).await?
                }
            }
        }
        Commands::Html { action } => {
            let (action, input) = match action {
                HtmlCommand::Escape { input } => (HtmlAction::Escape, input),
                HtmlCommand::Unescape { input } => (HtmlAction::Unescape, input),
                HtmlCommand::ToJsx { input, component } => (HtmlAction::ToJsx { component }, input),
            };
            commands::run_html(action, input.with_loader(&reads), as_json).await?;
        }
        Commands::Regex {
            pattern,
            input,
            flags,
            replace,
        } => {
            let app = open().await?;
            let input = input.with_loader(&reads);
            commands::run_regex(&app, pattern, flags, replace, input, as_json).await?;
        }
        Commands::Timestamp { value, unit } => commands::run_timestamp(value, unit, as_json)?,
        Commands::Favicon {
            image,
            out,
            app_name,
            short_name,
            theme_color,
            background_color,
        } => {
            let mut options = favicon_defaults;
            options.app_name = app_name.unwrap_or(options.app_name);
            options.short_name = short_name.or(options.short_name);
            options.theme_color = theme_color.unwrap_or(options.theme_color);
            options.background_color = background_color.unwrap_or(options.background_color);
            commands::run_favicon(&image, &out, options).await?;
        }
        Commands::Bookmark { action } => {
            let app = open().await?;
            match action {
                BookmarkAction::Add {
                    title,
                    href,
                    description,
                } => {
                    let new = NewBookmark {
                        title,
                        description,
                        href,
                    };
                    commands::run_bookmark_add(&app, new, as_json).await?
                }
                BookmarkAction::List => commands::run_bookmark_list(&app, as_json).await?,
                BookmarkAction::Remove { id } => commands::run_bookmark_remove(&app, &id).await?,
            }
        }
        Commands::Feedback {
            message,
            email,
            page,
        } => {
            let new = NewFeedback { message, email, page };
            commands::run_feedback(&open().await?, new).await?;
        }
        Commands::RequestTool {
            name,
            description,
            email,
        } => {
            let new = NewToolRequest {
                tool_name: name,
                description,
                email,
            };
            commands::run_tool_request(&open().await?, new).await?;
        }
        Commands::Serve => server::run_server(open().await?).await?,
    }

    Ok(())
}
