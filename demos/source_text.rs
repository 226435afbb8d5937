//! Source Text Example - Extract And Generate
//!
//! Reads a file (or a built-in HTML snippet), expands variant groups,
//! extracts candidate tokens with the default split extractor and prints
//! the resulting stylesheet. Tokens that matched nothing are listed after
//! the CSS.
//!
//! ```text
//! cargo run --example source-text -- index.html
//! ```

use atomcss_rs::{GenerateInput, GenerateOptions, UserConfig, create_generator, presets};

const SAMPLE: &str = r#"
<main class="md:(flex p-4) bg-gray-100">
  <h1 class="text-blue-700 hover:(text-blue-500 !border-red-500)">Title</h1>
  <p class="m-2 lg:m-4 opacity-50 not-a-utility">Body</p>
</main>
"#;

#[tokio::main]
async fn main() -> atomcss_rs::Result<()> {
    let path = std::env::args().nth(1);
    let code = match &path {
        Some(path) => std::fs::read_to_string(path)?,
        None => SAMPLE.to_string(),
    };

    // Group syntax like `md:(flex p-4)` is expanded before extraction.
    let code = atomcss_rs::expand_variant_group(&code).join(" ");

    let generator = create_generator(UserConfig::new().preset(presets::mini())).await?;
    let result = generator
        .generate(
            GenerateInput::source(code, path.as_deref()),
            &GenerateOptions::default(),
        )
        .await?;

    println!("{}", result.css);
    if !result.unmatched.is_empty() {
        eprintln!();
        eprintln!(
            "unmatched: {}",
            result.unmatched.iter().cloned().collect::<Vec<_>>().join(" ")
        );
    }
    Ok(())
}
