use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use cmf_extensions::app::Application;
use cmf_extensions::config::{Cli, Command, Settings};
use cmf_extensions::error::ExtError;
use cmf_extensions::logging::init_logging;
use cmf_extensions::manager::BootOutcome;
use cmf_extensions::scaffold::{make_module, make_theme};
use cmf_extensions::session::Session;
use cmf_extensions::view::ViewFinder;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let settings = Settings::load(&cli.root, cli.config.as_deref())
        .with_context(|| format!("Failed to load settings for {}", cli.root.display()))?;
    init_logging(settings.logging.filter.as_deref(), cli.verbose);

    match cli.command {
        Command::MakeModule { name } => match make_module(&settings, &name) {
            Ok(report) => {
                println!("Module [{}] created at {}", report.name, report.path.display());
                if cli.verbose {
                    for file in &report.files {
                        println!("  {}", file.display());
                    }
                }
                Ok(ExitCode::SUCCESS)
            }
            Err(e @ ExtError::ModuleExists { .. }) => {
                eprintln!("{e}");
                Ok(ExitCode::from(1))
            }
            Err(e) => Err(e).context("Failed to create module"),
        },

        Command::MakeTheme { name, admin, force } => {
            match make_theme(&settings, &name, admin, force) {
                Ok(report) => {
                    println!("Theme [{}] created at {}", report.name, report.path.display());
                    if cli.verbose {
                        for file in &report.files {
                            println!("  {}", file.display());
                        }
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Err(e @ ExtError::ThemeExists { .. }) => {
                    eprintln!("{e}");
                    eprintln!("Use --force to replace the existing theme.");
                    Ok(ExitCode::from(1))
                }
                Err(e) => Err(e).context("Failed to create theme"),
            }
        }

        Command::ModuleList => {
            let mut app = Application::new(settings);
            discover(&mut app)?;

            let modules = app.modules();
            if modules.is_empty() && modules.disabled().next().is_none() {
                println!("No modules found in {}", modules.root().display());
                return Ok(ExitCode::SUCCESS);
            }
            for module in modules.modules() {
                println!("  {:<24} enabled   {}", module.name(), version_of(module));
            }
            for module in modules.disabled() {
                println!("  {:<24} disabled  {}", module.name(), version_of(module));
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::ModuleEnable { name } => toggle_module(settings, &name, true),

        Command::ModuleDisable { name } => toggle_module(settings, &name, false),

        Command::ModuleCheck { name } => {
            let mut app = Application::new(settings);
            discover(&mut app)?;

            let modules = app.modules();
            let Some(module) = modules
                .find(&name)
                .or_else(|| modules.disabled().find(|m| m.name() == name))
            else {
                eprintln!("Module [{name}] not found");
                return Ok(ExitCode::from(1));
            };

            match module.check_dependencies(|dep| modules.has(dep)) {
                Ok(()) => {
                    println!("Module [{name}] dependencies satisfied");
                    Ok(ExitCode::SUCCESS)
                }
                Err(e @ ExtError::MissingDependency { .. }) => {
                    eprintln!("{e}");
                    Ok(ExitCode::from(1))
                }
                Err(e) => Err(e).with_context(|| format!("Failed to check module {name}")),
            }
        }

        Command::ThemeList => {
            let app = Application::new(settings);
            let themes = app.themes();
            let all = themes.all().context("Failed to list themes")?;
            if all.is_empty() {
                println!("No themes found in {}", themes.config().path.display());
                return Ok(ExitCode::SUCCESS);
            }

            for theme in &all {
                let marker = if theme.name() == themes.config().default {
                    " (default)"
                } else if theme.name() == themes.config().admin_default {
                    " (admin default)"
                } else {
                    ""
                };
                let description = match theme.manifest() {
                    Ok(Some(manifest)) => manifest.description,
                    Ok(None) => String::new(),
                    Err(e) => format!("invalid theme.json: {e}"),
                };
                println!("  {:<24} {}{}", theme.name(), description, marker);
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::ThemeAsset { path, theme } => {
            let app = Application::new(settings);
            let theme = match theme {
                Some(name) => app.themes().theme(&name),
                None => app.themes().default_theme(),
            };
            println!("{}", theme.asset(&path));
            Ok(ExitCode::SUCCESS)
        }

        Command::ViewFind {
            name,
            theme,
            admin_theme,
        } => {
            let mut app = Application::new(settings);
            discover(&mut app)?;

            let mut session = Session::new();
            app.themes()
                .select_for_request(&mut session, theme.as_deref(), admin_theme.as_deref());
            let finder = app.view_finder(&session);

            if cli.verbose {
                for candidate in finder.candidates(&name) {
                    eprintln!("  candidate: {}", candidate.display());
                }
            }

            match finder.find(&name) {
                Ok(path) => {
                    println!("{}", path.display());
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    eprintln!("{e}");
                    Ok(ExitCode::from(1))
                }
            }
        }

        Command::Boot => {
            let mut app = Application::new(settings);
            let report = app.boot().context("Boot failed")?;

            for (module, outcome) in &report.outcomes {
                let status = match outcome {
                    BootOutcome::Registered(provider) => format!("registered {provider}"),
                    BootOutcome::NoProvider => "no provider".to_string(),
                    BootOutcome::Failed(message) => format!("FAILED: {message}"),
                };
                println!("  {module}: {status}");
            }
            println!(
                "Booted {} module(s), {} provider(s) registered",
                report.outcomes.len(),
                report.registered()
            );

            if report.has_failures() {
                Ok(ExitCode::from(1))
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

fn discover(app: &mut Application) -> Result<()> {
    let (modules, hooks) = app.modules_mut();
    modules.discover(hooks).context("Module discovery failed")?;
    Ok(())
}

fn toggle_module(settings: Settings, name: &str, enable: bool) -> Result<ExitCode> {
    let mut app = Application::new(settings);
    discover(&mut app)?;

    let (modules, hooks) = app.modules_mut();
    let changed = if enable {
        modules.enable(name, hooks)
    } else {
        modules.disable(name, hooks)
    }
    .with_context(|| format!("Failed to update module {name}"))?;

    if !changed {
        eprintln!("Module [{name}] not found or has no module.json");
        return Ok(ExitCode::from(1));
    }

    println!(
        "Module [{name}] {}",
        if enable { "enabled" } else { "disabled" }
    );
    Ok(ExitCode::SUCCESS)
}

fn version_of(module: &cmf_extensions::module::Module) -> String {
    match module.manifest() {
        Ok(Some(manifest)) => manifest.version.unwrap_or_default(),
        _ => String::new(),
    }
}
