//! Generate Example - Tokens In, Stylesheet Out
//!
//! Builds a generator from the mini preset plus a few user additions:
//! - a literal shortcut (`btn`) and a dynamic one (`card-<color>`)
//! - a custom rule with its own layer
//! - a blocklist entry
//!
//! Tokens are taken from the command line, or a built-in list when none
//! are given. Set `ATOMCSS_LOG=debug` and pass `--log <file>` to see the
//! per-token diagnostics.
//!
//! ```text
//! cargo run --example generate -- hover:btn md:card-red m-2 p-4
//! ```

use atomcss_rs::syntax::entries::entries;
use atomcss_rs::{
    BlockRule, GenerateInput, GenerateOptions, Rule, Shortcut, UserConfig, create_generator,
    init_logger, log, presets,
};

const DEFAULT_TOKENS: &[&str] = &[
    "btn",
    "hover:btn",
    "card-blue",
    "md:card-red",
    "m-2",
    "lg:px-4",
    "dark:text-white",
    "focus:!bg-red-500",
    "font-brand",
    "debug-outline",
    "not-a-utility",
];

fn config() -> UserConfig {
    UserConfig::new()
        .preset(presets::mini())
        .shortcut(Shortcut::literal(
            "btn",
            "px-4 py-1 border bg-blue-500 hover:(bg-blue-700)",
        ))
        .shortcut(Shortcut::dynamic(r"^card-(.+)$", |m, _ctx| match m.get(1) {
            Some(color) => vec![
                "p-4".to_string(),
                "border".to_string(),
                format!("border-{}-500", color),
            ],
            None => Vec::new(),
        }))
        .rule(
            Rule::literal(
                "font-brand",
                entries(&[("font-family", "\"Inter\", sans-serif")]),
            )
            .layer("fonts"),
        )
        .layer("fonts", -20)
        .block(BlockRule::literal("debug-outline").with_message("debug utilities are disabled"))
}

#[tokio::main]
async fn main() -> atomcss_rs::Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    if let Some(pos) = args.iter().position(|a| a == "--log") {
        if let Some(path) = args.get(pos + 1).cloned() {
            init_logger(&path)?;
            args.drain(pos..=pos + 1);
        }
    }
    let minify = if let Some(pos) = args.iter().position(|a| a == "--minify") {
        args.remove(pos);
        true
    } else {
        false
    };

    let tokens: Vec<String> = if args.is_empty() {
        DEFAULT_TOKENS.iter().map(|t| t.to_string()).collect()
    } else {
        args
    };

    let generator = create_generator(config()).await?;
    log::info!(
        "generator ready: {} rules, {} shortcuts",
        generator.config().rule_count(),
        generator.config().shortcut_count()
    );

    let options = GenerateOptions {
        minify,
        extended_info: true,
        ..Default::default()
    };
    let result = generator
        .generate(GenerateInput::tokens(tokens), &options)
        .await?;

    println!("{}", result.css);

    eprintln!();
    eprintln!("layers:    {}", result.layers.join(", "));
    eprintln!("matched:   {}", result.matched.len());
    for token in &result.unmatched {
        eprintln!("unmatched: {}", token);
    }
    for (token, reason) in &result.blocked {
        eprintln!("blocked:   {} ({})", token, reason);
    }
    if let Some(info) = &result.info {
        for (token, info) in info {
            if let Some(shortcut) = &info.shortcut {
                eprintln!("shortcut:  {} -> {}", token, shortcut);
            }
        }
    }
    Ok(())
}
