//! Subcommand handlers.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::args::{Args, Command, ConfigAction};
use super::enums::OutputFormat;
use crate::bitmap::{Image, ImageLibrary, SaveOptions};
use crate::codec::NativeCodec;
use crate::config::{default_path as get_config_path, Config, ConfigError, DEFAULT_CONFIG};
use crate::error::{ImageError, RenderError};
use crate::render::{self, CharIndexing, Document, HtmlOptions, RenderOptions};

/// Errors surfaced by the command-line front end.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Usage(String),
}

/// Settings shared by `render` and `frames` after merging CLI and config.
struct RenderSettings {
    text: String,
    options: RenderOptions,
    html: HtmlOptions,
    output_format: OutputFormat,
}

impl RenderSettings {
    fn merge(
        config: &Config,
        text: Option<&str>,
        direct_indexing: bool,
        output_format: OutputFormat,
    ) -> Self {
        let cli_indexing = direct_indexing.then_some(CharIndexing::Direct);
        Self {
            text: config.text(text),
            options: RenderOptions {
                indexing: config.indexing(cli_indexing),
            },
            html: config.html_options(),
            output_format,
        }
    }
}

/// Run a parsed command line.
pub fn run(args: Args) -> Result<(), CliError> {
    if let Command::Config { action } = &args.command {
        return handle_config_action(action.clone(), args.config.as_deref());
    }

    let config = Config::load(args.config.as_deref())?;
    let library = ImageLibrary::default();

    match args.command {
        Command::Render {
            image,
            text,
            output,
            output_format,
            thumbnail,
            direct_indexing,
        } => {
            let settings =
                RenderSettings::merge(&config, text.as_deref(), direct_indexing, output_format);
            render_image(&library, &image, output.as_deref(), thumbnail, &settings)
        }
        Command::Info { image } => print_info(&library, &image),
        Command::Convert {
            input,
            output,
            format,
            quality,
            progressive,
        } => {
            let options = SaveOptions {
                format,
                quality: config.quality(quality.map(Into::into)),
                progressive: progressive || config.save.progressive,
            };
            library.with_image(&input, |image| -> Result<(), CliError> {
                image.save(&output, &options)?;
                log::info!("Wrote {}", output.display());
                Ok(())
            })
        }
        Command::Crop {
            input,
            output,
            left,
            top,
            right,
            bottom,
        } => {
            let options = save_options(&config);
            library.with_image(&input, |image| -> Result<(), CliError> {
                image.with_crop(left, top, right, bottom, |cropped| {
                    save_derived(cropped, &output, &options)
                })
            })
        }
        Command::Thumbnail { input, output, max } => {
            let options = save_options(&config);
            library.with_image(&input, |image| -> Result<(), CliError> {
                image.with_thumbnail(max, |thumb| save_derived(thumb, &output, &options))
            })
        }
        Command::Rescale {
            input,
            output,
            width,
            height,
            filter,
        } => {
            let options = save_options(&config);
            library.with_image(&input, |image| -> Result<(), CliError> {
                let scaled = image.rescale(width, height, filter.into())?;
                save_derived(&scaled, &output, &options)
            })
        }
        Command::Frames {
            dir,
            out_dir,
            text,
            output_format,
            direct_indexing,
        } => {
            let settings =
                RenderSettings::merge(&config, text.as_deref(), direct_indexing, output_format);
            render_frames(&library, &dir, &out_dir, &settings).map(|count| {
                println!("Rendered {} frame(s) to {}", count, out_dir.display());
            })
        }
        Command::Config { .. } => Ok(()),
    }
}

fn save_options(config: &Config) -> SaveOptions {
    SaveOptions {
        format: None,
        quality: config.quality(None),
        progressive: config.save.progressive,
    }
}

fn save_derived(image: &Image<'_>, output: &Path, options: &SaveOptions) -> Result<(), CliError> {
    image.save(output, options)?;
    log::info!(
        "Wrote {}x{} image to {}",
        image.width()?,
        image.height()?,
        output.display()
    );
    Ok(())
}

fn render_document<C: NativeCodec>(
    library: &ImageLibrary<C>,
    path: &Path,
    thumbnail: Option<u32>,
    settings: &RenderSettings,
) -> Result<Document, CliError> {
    library.with_image(path, |image| -> Result<Document, CliError> {
        let pixels = match thumbnail {
            Some(max) => image.with_thumbnail(max, |thumb| thumb.raw_pixels())?,
            None => image.raw_pixels()?,
        };
        Ok(render::render(&pixels, &settings.text, &settings.options)?)
    })
}

fn write_document(
    document: &Document,
    settings: &RenderSettings,
    out: &mut dyn Write,
) -> Result<(), RenderError> {
    let mut out = out;
    match settings.output_format {
        OutputFormat::Html => render::write_html(document, &settings.html, &mut out),
        OutputFormat::Json => render::write_json(document, &mut out),
    }
}

fn write_to_file(
    document: &Document,
    settings: &RenderSettings,
    path: &Path,
) -> Result<(), CliError> {
    let mut out = BufWriter::new(File::create(path)?);
    write_document(document, settings, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Render one image to `output`, or stdout when no output is given.
fn render_image<C: NativeCodec>(
    library: &ImageLibrary<C>,
    path: &Path,
    output: Option<&Path>,
    thumbnail: Option<u32>,
    settings: &RenderSettings,
) -> Result<(), CliError> {
    let document = render_document(library, path, thumbnail, settings)?;
    match output {
        Some(output) => {
            write_to_file(&document, settings, output)?;
            let (w, h) = settings.html.layout().page_size(&document);
            log::info!("Wrote {} ({}x{} px page)", output.display(), w, h);
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            write_document(&document, settings, &mut lock)?;
            lock.flush()?;
        }
    }
    Ok(())
}

/// Image files directly inside `dir`, sorted by name.
fn frame_paths<C: NativeCodec>(
    library: &ImageLibrary<C>,
    dir: &Path,
) -> Result<Vec<PathBuf>, CliError> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if library.is_image(&path) {
            paths.push(path);
        } else {
            log::debug!("Skipping {}", path.display());
        }
    }
    paths.sort();
    Ok(paths)
}

/// Render each image in `dir` to `out_dir/frameNNNN.<ext>`. Returns the
/// number of frames written.
fn render_frames<C: NativeCodec>(
    library: &ImageLibrary<C>,
    dir: &Path,
    out_dir: &Path,
    settings: &RenderSettings,
) -> Result<usize, CliError> {
    if !dir.is_dir() {
        return Err(CliError::Usage(format!(
            "'{}' is not a directory",
            dir.display()
        )));
    }
    std::fs::create_dir_all(out_dir)?;

    let paths = frame_paths(library, dir)?;
    for (index, path) in paths.iter().enumerate() {
        log::info!("Frame {}: {}", index, path.display());
        let document = render_document(library, path, None, settings)?;
        let name = format!("frame{:04}.{}", index, settings.output_format.extension());
        write_to_file(&document, settings, &out_dir.join(name))?;
    }
    Ok(paths.len())
}

fn print_info<C: NativeCodec>(library: &ImageLibrary<C>, path: &Path) -> Result<(), CliError> {
    library.with_image(path, |image| -> Result<(), CliError> {
        println!("File:       {}", path.display());
        println!("Format:     {}", image.format_name());
        println!("Dimensions: {}x{}", image.width()?, image.height()?);
        println!("Bit depth:  {}", image.bits_per_pixel()?);
        println!("Stride:     {} bytes (32-bit)", image.stride()?);
        Ok(())
    })
}

/// Handle config subcommand actions.
pub fn handle_config_action(action: ConfigAction, path: Option<&Path>) -> Result<(), CliError> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);
    match action {
        ConfigAction::Show => {
            let config = Config::load(Some(&config_path))?;
            let html = config.html_options();
            println!("Current configuration:");
            println!("  Text: {:?}", config.text(None));
            println!("  Indexing: {}", config.indexing(None));
            println!("  Cell size: {}px", html.cell_size);
            println!("  Font: {} {}px", html.font_family, html.font_size);
            println!("  Quality: {}", config.quality(None));
            println!(
                "  Progressive: {}",
                if config.save.progressive { "yes" } else { "no" }
            );
            println!();

            if config_path.exists() {
                println!("Config file: {} (exists)", config_path.display());
            } else {
                println!("Config file: {} (not found)", config_path.display());
            }
            Ok(())
        }
        ConfigAction::Init => {
            if config_path.exists() {
                return Err(CliError::Usage(format!(
                    "Config file already exists: {}\nUse 'pixel-markup config show' to view current settings.",
                    config_path.display()
                )));
            }

            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&config_path, DEFAULT_CONFIG)?;

            println!("Created config file: {}", config_path.display());
            Ok(())
        }
    }
}
