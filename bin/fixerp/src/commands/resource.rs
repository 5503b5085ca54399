//! Generic resource CRUD commands.
//!
//! `fixerp get repairs`, `fixerp create customer`, etc.
//! Translates resource names to REST API paths.

use anyhow::Result;

use crate::config::ClientConfig;

/// Map a singular/plural resource name to the API path prefix.
fn resource_path(resource: &str) -> Result<(&'static str, &'static str)> {
    // Returns (singular, api_path).
    match resource.to_lowercase().as_str() {
        // Auth
        "user" | "users" => Ok(("user", "/auth/users")),
        // Catalog
        "brand" | "brands" => Ok(("brand", "/catalog/brands")),
        "model" | "models" | "phone" | "phones" => Ok(("model", "/catalog/models")),
        "supplier" | "suppliers" => Ok(("supplier", "/catalog/suppliers")),
        // CRM
        "customer" | "customers" => Ok(("customer", "/crm/customers")),
        // Inventory
        "component" | "components" => Ok(("component", "/inventory/components")),
        "movement" | "movements" => Ok(("movement", "/inventory/movements")),
        // Repair
        "repair" | "repairs" => Ok(("repair", "/repair/repairs")),
        "warranty" | "warranties" => Ok(("warranty", "/repair/warranties")),
        // Sell
        "item" | "items" => Ok(("item", "/sell/items")),
        "sale" | "sales" => Ok(("sale", "/sell/sales")),
        _ => Err(anyhow::anyhow!("Unknown resource type: {}", resource)),
    }
}

/// HTTP client helper.
fn build_client(ctx: &crate::config::Context) -> Result<(reqwest::blocking::Client, String)> {
    if ctx.server.is_empty() {
        anyhow::bail!(
            "No server URL set for context \"{}\". Run `fixerp context set {} --server <url>`.",
            ctx.name,
            ctx.name
        );
    }

    let mut headers = reqwest::header::HeaderMap::new();
    if !ctx.token.is_empty() {
        let val = format!("Bearer {}", ctx.token);
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&val)?,
        );
    }

    let client = reqwest::blocking::Client::builder()
        .default_headers(headers)
        .build()?;

    Ok((client, ctx.server.trim_end_matches('/').to_string()))
}

/// Pull the error message out of a `{"code", "message"}` body.
fn error_message(body: &serde_json::Value) -> &str {
    body["message"].as_str().unwrap_or("unknown error")
}

/// GET a resource (list or get by ID).
pub fn get(
    resource: &str,
    id: Option<&str>,
    limit: Option<usize>,
    offset: Option<usize>,
    client_config_path: &std::path::Path,
) -> Result<()> {
    let config = ClientConfig::load(client_config_path)?;
    let ctx = config
        .current()
        .ok_or_else(|| anyhow::anyhow!("No current context."))?;

    let (_, api_path) = resource_path(resource)?;
    let (client, base_url) = build_client(ctx)?;

    let url = if let Some(id) = id {
        format!("{}{}/{}", base_url, api_path, id)
    } else {
        let mut u = format!("{}{}", base_url, api_path);
        let mut params = Vec::new();
        if let Some(l) = limit {
            params.push(format!("limit={}", l));
        }
        if let Some(o) = offset {
            params.push(format!("offset={}", o));
        }
        if !params.is_empty() {
            u.push('?');
            u.push_str(&params.join("&"));
        }
        u
    };

    let resp = client.get(&url).send()?;
    let status = resp.status();
    let body: serde_json::Value = resp.json()?;

    if !status.is_success() {
        anyhow::bail!("Error ({}): {}", status, error_message(&body));
    }

    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

/// CREATE a resource.
pub fn create(resource: &str, json_body: &str, client_config_path: &std::path::Path) -> Result<()> {
    let config = ClientConfig::load(client_config_path)?;
    let ctx = config
        .current()
        .ok_or_else(|| anyhow::anyhow!("No current context."))?;

    let (singular, api_path) = resource_path(resource)?;
    let (client, base_url) = build_client(ctx)?;

    let url = format!("{}{}", base_url, api_path);
    let body: serde_json::Value =
        serde_json::from_str(json_body).map_err(|e| anyhow::anyhow!("Invalid JSON: {}", e))?;

    let resp = client.post(&url).json(&body).send()?;
    let status = resp.status();
    let result: serde_json::Value = resp.json()?;

    if !status.is_success() {
        anyhow::bail!("Error ({}): {}", status, error_message(&result));
    }

    println!("{} created.", singular);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// UPDATE a resource (PATCH).
pub fn update(
    resource: &str,
    id: &str,
    json_body: &str,
    client_config_path: &std::path::Path,
) -> Result<()> {
    let config = ClientConfig::load(client_config_path)?;
    let ctx = config
        .current()
        .ok_or_else(|| anyhow::anyhow!("No current context."))?;

    let (singular, api_path) = resource_path(resource)?;
    let (client, base_url) = build_client(ctx)?;

    let url = format!("{}{}/{}", base_url, api_path, id);
    let body: serde_json::Value =
        serde_json::from_str(json_body).map_err(|e| anyhow::anyhow!("Invalid JSON: {}", e))?;

    let resp = client.patch(&url).json(&body).send()?;
    let status = resp.status();
    let result: serde_json::Value = resp.json()?;

    if !status.is_success() {
        anyhow::bail!("Error ({}): {}", status, error_message(&result));
    }

    println!("{} {} updated.", singular, id);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// DELETE a resource.
pub fn delete(resource: &str, id: &str, client_config_path: &std::path::Path) -> Result<()> {
    let config = ClientConfig::load(client_config_path)?;
    let ctx = config
        .current()
        .ok_or_else(|| anyhow::anyhow!("No current context."))?;

    let (singular, api_path) = resource_path(resource)?;
    let (client, base_url) = build_client(ctx)?;

    let url = format!("{}{}/{}", base_url, api_path, id);
    let resp = client.delete(&url).send()?;
    let status = resp.status();

    if !status.is_success() {
        let body: serde_json::Value = resp.json().unwrap_or_default();
        anyhow::bail!("Error ({}): {}", status, error_message(&body));
    }

    println!("{} {} deleted.", singular, id);
    Ok(())
}

/// STATUS — check server health.
pub fn status(client_config_path: &std::path::Path) -> Result<()> {
    let config = ClientConfig::load(client_config_path)?;
    let ctx = config
        .current()
        .ok_or_else(|| anyhow::anyhow!("No current context."))?;

    println!("Context:   {}", ctx.name);
    println!(
        "Server:    {}",
        if ctx.server.is_empty() { "-" } else { &ctx.server }
    );

    if ctx.server.is_empty() {
        println!("Status:    no server configured");
        return Ok(());
    }

    let (client, base_url) = build_client(ctx)?;
    match client.get(&format!("{}/health", base_url)).send() {
        Ok(resp) if resp.status().is_success() => {
            println!("Status:    connected");
        }
        Ok(resp) => {
            println!("Status:    error ({})", resp.status());
        }
        Err(e) => {
            println!("Status:    disconnected ({})", e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_names_resolve() {
        assert_eq!(resource_path("repairs").unwrap().1, "/repair/repairs");
        assert_eq!(resource_path("Customer").unwrap().1, "/crm/customers");
        assert_eq!(resource_path("phones").unwrap().1, "/catalog/models");
        assert_eq!(resource_path("items").unwrap().1, "/sell/items");
        assert!(resource_path("invoices").is_err());
    }
}
