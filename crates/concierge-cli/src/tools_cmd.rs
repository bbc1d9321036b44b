use concierge_rpc::RpcClient;

/// List the tool catalog of a running server.
pub async fn list(server_url: &str) -> anyhow::Result<()> {
    let client = RpcClient::new(reqwest::Client::new(), format!("{server_url}/mcp"));

    let tools = client.list_tools().await?;
    for tool in tools {
        println!("{:<22} {}", tool.name, tool.description);
    }

    Ok(())
}

/// Invoke a single tool and print the raw result.
pub async fn call(server_url: &str, name: &str, args: &str) -> anyhow::Result<()> {
    let arguments: serde_json::Value = serde_json::from_str(args)
        .map_err(|e| anyhow::anyhow!("--args must be a JSON object: {e}"))?;

    let client = RpcClient::new(reqwest::Client::new(), format!("{server_url}/mcp"));

    match client.call_tool(name, arguments).await {
        Ok(result) => println!("{}", serde_json::to_string_pretty(&result)?),
        Err(e) => eprintln!("Error: {e}"),
    }

    Ok(())
}
