use reqwest::Client;

/// Send one chat message and print the reply.
pub async fn run(server_url: &str, message: &str) -> anyhow::Result<()> {
    let client = Client::new();

    let resp = client
        .post(format!("{server_url}/chat"))
        .json(&serde_json::json!({"message": message}))
        .send()
        .await?;

    if !resp.status().is_success() {
        let body = resp.text().await?;
        anyhow::bail!("Chat request failed: {body}");
    }

    let result: serde_json::Value = resp.json().await?;
    println!("{}", result["reply"].as_str().unwrap_or_default());

    Ok(())
}
