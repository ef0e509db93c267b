//! Print the OpenAPI document as pretty JSON.
//!
//! ```text
//! cargo run --bin openapi-dump > openapi.json
//! ```

use backend::ApiDoc;
use utoipa::OpenApi;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let json = ApiDoc::openapi().to_pretty_json()?;
    println!("{json}");
    Ok(())
}
