use std::time::Duration;

use chat_ox::{
    Client, Context, Message, Options, Tool,
    tool::{BoxedError, InputSchema, Property},
    vendor::{Flavor, OpenAiCompatible},
};
use futures_util::StreamExt;
use serde::Deserialize;

#[derive(Deserialize)]
struct City {
    city: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = Client::new(OpenAiCompatible::load_from_env(
        Flavor::Groq,
        "llama-3.3-70b-versatile",
    )?);

    let schema = InputSchema::from([(
        "city".to_string(),
        Property::new("string").with_description("City name").required(),
    )]);
    let weather = Tool::typed("Current weather for a city", schema, |_ctx, args: City| async move {
        Ok::<_, BoxedError>(format!("Sunny and 21°C in {}", args.city))
    });

    let options = Options::builder()
        .system_prompt("Answer in one sentence.")
        .build()
        .with_tool("weather", weather);
    let ctx = Context::new().with_timeout(Duration::from_secs(60));

    let question = [Message::user("What's the weather in Paris?")];
    let mut reader = client.generate_stream(&ctx, &question, &options);
    while let Some(delta) = reader.next().await {
        print!("{}", delta?);
    }
    println!();

    Ok(())
}
