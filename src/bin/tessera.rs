use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tessera::{Catalog as _, Color, Compositor, CompositorOpts, RenderMode, Template, TemplateDef};

#[derive(Parser, Debug)]
#[command(name = "tessera", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,

    /// Directory of TTF/OTF fonts for text modules, added to `TESSERA_FONT_DIR`.
    #[arg(long, global = true)]
    fonts: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a template to a PNG.
    Render(RenderArgs),
    /// Print a template's modules, effects and inputs.
    Inspect(InspectArgs),
    /// List the module and effect types the builtin registry knows.
    Types,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input template JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[arg(long, value_enum, default_value_t = ModeChoice::Export)]
    mode: ModeChoice,

    /// Export background as `#RRGGBB` or `#RRGGBBAA`. Transparent when omitted.
    #[arg(long)]
    clear: Option<String>,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Input template JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeChoice {
    Display,
    Export,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let registry = registry(cli.fonts.as_deref())?;
    match cli.cmd {
        Command::Render(args) => cmd_render(args, &registry),
        Command::Inspect(args) => cmd_inspect(args, &registry),
        Command::Types => cmd_types(&registry),
    }
}

fn registry(fonts: Option<&Path>) -> anyhow::Result<tessera::Registry> {
    let book = tessera::FontBook::from_env();
    if let Some(dir) = fonts {
        let loaded = book
            .load_dir(dir)
            .with_context(|| format!("load fonts from '{}'", dir.display()))?;
        if loaded == 0 {
            eprintln!("no fonts found in {}", dir.display());
        }
    }
    Ok(tessera::Registry::with_fonts(book))
}

fn load_template(path: &Path, registry: &tessera::Registry) -> anyhow::Result<Template> {
    let def = TemplateDef::from_path(path)
        .with_context(|| format!("read template '{}'", path.display()))?;
    let template = Template::from_def(&def, registry)
        .with_context(|| format!("load template '{}'", def.name))?;
    Ok(template)
}

fn cmd_render(args: RenderArgs, registry: &tessera::Registry) -> anyhow::Result<()> {
    let mut template = load_template(&args.in_path, registry)?;

    let clear = args
        .clear
        .as_deref()
        .map(Color::parse_hex)
        .transpose()
        .context("parse --clear")?
        .map(|c| [c.r, c.g, c.b, c.a]);
    let opts = CompositorOpts::from_env().with_clear_rgba(clear);
    let mode = match args.mode {
        ModeChoice::Display => RenderMode::Display,
        ModeChoice::Export => RenderMode::Export,
    };

    let (rendered, failure) = match Compositor::new(opts).render(&mut template, mode) {
        Ok(rendered) => (rendered, None),
        Err(failure) => {
            eprintln!("render failed: {failure}; writing partial frame");
            (failure.partial.clone(), Some(failure))
        }
    };
    for s in &rendered.skipped {
        eprintln!("skipped module {}: {}", s.index, s.reason);
    }

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let frame = rendered.frame.into_straight();
    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;
    eprintln!("wrote {}", args.out.display());

    match failure {
        Some(f) => Err(f.into()),
        None => Ok(()),
    }
}

fn cmd_inspect(args: InspectArgs, registry: &tessera::Registry) -> anyhow::Result<()> {
    let template = load_template(&args.in_path, registry)?;
    let table = template.params();
    let canvas = template.canvas();

    println!("{} ({}x{})", template.name(), canvas.width, canvas.height);
    for (i, module) in template.modules().iter().enumerate() {
        println!("[{i}] {} <{}>", module.display_name(), module.type_name());
        print_inputs(module.layer(), table, "    ");
        for effect in module.effects() {
            println!("    + {} <{}>", effect.display_name(), effect.type_name());
            print_inputs(effect.layer(), table, "        ");
        }
    }
    if !template.is_valid() {
        eprintln!("template has invalid inputs");
    }
    Ok(())
}

fn print_inputs(layer: &tessera::LayerState, table: &tessera::ParamTable, indent: &str) {
    for (name, id) in layer.inputs().sorted(table) {
        let Some(slot) = table.slot(id) else {
            continue;
        };
        let marker = if slot.is_valid() { ' ' } else { '!' };
        let mut value = slot.serialize().to_string();
        if value.chars().count() > 60 {
            value = value.chars().take(57).chain("...".chars()).collect();
        }
        println!("{indent}{marker}{name} ({}) = {value}", slot.tag());
    }
}

fn cmd_types(registry: &tessera::Registry) -> anyhow::Result<()> {
    println!("modules:");
    for name in registry.module_types() {
        println!("  {name}");
    }
    println!("effects:");
    for name in registry.effect_types() {
        println!("  {name}");
    }
    let families = registry.fonts().families();
    if !families.is_empty() {
        println!("fonts:");
        for name in families {
            println!("  {name}");
        }
    }
    Ok(())
}
