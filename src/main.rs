use clap::{Parser, Subcommand};
use log::{LevelFilter, Log, Metadata, Record};
use pagewright::cache::{self, RenderManifest, RenderStatus};
use pagewright::compose::{Composer, Composition, Severity};
use pagewright::config::{self, EngineConfig};
use pagewright::language::{FilePreferenceStore, LanguageContext, PreferenceStore};
use pagewright::page::{self, Alternate, PageOptions};
use pagewright::site::{FileSiteSource, SiteConfig, SiteSource};
use pagewright::store::ImageStore;
use pagewright::output;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pagewright")]
#[command(about = "Compose multilingual landing pages from a site document")]
#[command(long_about = "\
Compose multilingual landing pages from a site document

The site document is JSON: an ordered list of section ids plus a map of
section descriptors. Each section names a component kind (Hero, About,
Services, Portfolio, Team, Testimonials, Contact, Footer), an optional
template variant, and its elements' content per language.

Project layout:

  pagewright.toml        # Engine config (optional)
  site.json              # Site document
  images/                # Image store: local-img-<stem> tokens
  .pagewright-lang       # Remembered language

Run 'pagewright gen-config' to generate a documented pagewright.toml.")]
#[command(version)]
struct Cli {
    /// Engine config file
    #[arg(long, default_value = "pagewright.toml", global = true)]
    config: PathBuf,

    /// Site document (JSON)
    #[arg(long, default_value = "site.json", global = true)]
    site: PathBuf,

    /// Compose in this language instead of the remembered one
    #[arg(long, global = true)]
    lang: Option<String>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compose the page and print the section inventory
    Compose {
        /// Print the composition as JSON instead
        #[arg(long)]
        json: bool,
    },
    /// Render the page to an HTML file
    Render {
        /// Output file (with --all-languages: directory)
        #[arg(long, default_value = "dist/index.html")]
        output: PathBuf,
        /// Render one page per supported language with a language switch
        #[arg(long)]
        all_languages: bool,
        /// Ignore the render manifest and re-render
        #[arg(long)]
        no_cache: bool,
    },
    /// Report sections the composer would skip or repair
    Check,
    /// Show the current language, or switch and remember it
    Lang {
        /// Language code to switch to
        code: Option<String>,
        /// Switch to the next supported language
        #[arg(long, conflicts_with = "code")]
        toggle: bool,
    },
    /// Print a stock pagewright.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match cli.command {
        Command::Compose { json } => {
            let session = Session::open(&cli.config, cli.lang.as_deref())?;
            let (site, images) = session.load_inputs(&cli.site)?;
            let composition = Composer::new(&images).compose(&site, &session.lang);
            if json {
                println!("{}", serde_json::to_string_pretty(&composition)?);
            } else {
                output::print_compose_output(&composition);
            }
        }
        Command::Render {
            output: out,
            all_languages,
            no_cache,
        } => {
            let session = Session::open(&cli.config, cli.lang.as_deref())?;
            let (site, images) = session.load_inputs(&cli.site)?;
            let composer = Composer::new(&images);
            let options = PageOptions::from_config(&session.engine.page);

            if all_languages {
                std::fs::create_dir_all(&out)?;
                let mut manifest = load_manifest(&out, no_cache);
                let alternates: Vec<Alternate> = session
                    .lang
                    .supported()
                    .iter()
                    .map(|l| Alternate {
                        language: l.clone(),
                        href: format!("index.{}.html", l),
                    })
                    .collect();
                let options = options.with_alternates(alternates.clone());
                for alt in &alternates {
                    let mut ctx = session.lang.clone();
                    ctx.switch_to(alt.language.as_str())?;
                    let composition = composer.compose(&site, &ctx);
                    let path = out.join(&alt.href);
                    let status = render_one(&composition, &options, &path, &mut manifest)?;
                    output::print_render_output(&options.title, &composition, &path, status);
                }
                manifest.save(&out)?;
            } else {
                let dir = parent_dir(&out);
                std::fs::create_dir_all(&dir)?;
                let mut manifest = load_manifest(&dir, no_cache);
                let composition = composer.compose(&site, &session.lang);
                let status = render_one(&composition, &options, &out, &mut manifest)?;
                manifest.save(&dir)?;
                output::print_render_output(&options.title, &composition, &out, status);
            }
        }
        Command::Check => {
            let session = Session::open(&cli.config, cli.lang.as_deref())?;
            let (site, images) = session.load_inputs(&cli.site)?;
            let issues = Composer::new(&images).check(&site, &session.lang);
            output::print_check_output(&issues);
            let errors = issues
                .iter()
                .filter(|i| i.severity == Severity::Error)
                .count();
            if errors > 0 {
                return Err(format!("{} section(s) would be skipped", errors).into());
            }
        }
        Command::Lang { code, toggle } => {
            let mut session = Session::open(&cli.config, cli.lang.as_deref())?;
            if let Some(code) = code {
                session.lang.switch_to(&code)?;
                session.preferences.save(session.lang.current())?;
            } else if toggle {
                session.lang.toggle();
                session.preferences.save(session.lang.current())?;
            }
            output::print_lang_output(&session.lang);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Config, resolved paths and language state shared by every command that
/// touches a project.
struct Session {
    engine: EngineConfig,
    base: PathBuf,
    preferences: FilePreferenceStore,
    lang: LanguageContext,
}

impl Session {
    fn open(config_path: &Path, lang: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        let engine = config::load_config(config_path)?;
        let base = parent_dir(config_path);
        let preferences = FilePreferenceStore::new(engine.preferences_file(&base));
        let mut ctx = LanguageContext::from_config(&engine.language, preferences.load().as_deref());
        if let Some(code) = lang {
            ctx.switch_to(code)?;
        }
        Ok(Self {
            engine,
            base,
            preferences,
            lang: ctx,
        })
    }

    /// Load the site document and the image store snapshot.
    fn load_inputs(
        &self,
        site_path: &Path,
    ) -> Result<(SiteConfig, ImageStore), Box<dyn std::error::Error>> {
        let site = FileSiteSource::new(site_path).load()?;
        let images_dir = self.engine.images_dir(&self.base);
        let images = ImageStore::load_dir(&images_dir)?;
        log::info!("{} images loaded from {}", images.len(), images_dir.display());
        for id in site.dangling_ids() {
            log::info!("sectionOrder lists {:?} but no such section exists", id);
        }
        Ok((site, images))
    }
}

/// Render a page unless the manifest says the file is already current.
fn render_one(
    composition: &Composition,
    options: &PageOptions,
    path: &Path,
    manifest: &mut RenderManifest,
) -> Result<RenderStatus, Box<dyn std::error::Error>> {
    let fingerprint = cache::fingerprint(composition, &options.cache_params());
    if manifest.is_fresh(path, &fingerprint) {
        return Ok(RenderStatus::Cached);
    }
    let html = page::render_page(composition, options).into_string();
    let outcome = cache::write_if_changed(path, html.as_bytes())?;
    manifest.record(path, fingerprint);
    Ok(outcome.into())
}

fn load_manifest(dir: &Path, no_cache: bool) -> RenderManifest {
    if no_cache {
        RenderManifest::empty()
    } else {
        RenderManifest::load(dir)
    }
}

/// Directory containing `path`, `.` for a bare file name. Config-relative
/// paths resolve against the config file's parent.
fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

// ============================================================================
// Logging
// ============================================================================

/// Plain stderr logger: `warning: message`.
struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let label = match record.level() {
                log::Level::Error => "error",
                log::Level::Warn => "warning",
                log::Level::Info => "info",
                log::Level::Debug => "debug",
                log::Level::Trace => "trace",
            };
            eprintln!("{}: {}", label, record.args());
        }
    }

    fn flush(&self) {}
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    // Only fails if a logger is already installed.
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
