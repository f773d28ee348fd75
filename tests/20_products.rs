mod common;

use anyhow::Result;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::Value;

fn png_part(name: &str) -> Part {
    Part::bytes(vec![0x89, 0x50, 0x4E, 0x47, 0, 0, 0, 0])
        .file_name(name.to_string())
        .mime_str("image/png")
        .expect("mime")
}

#[tokio::test]
async fn more_than_ten_images_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let mut form = Form::new().text("name", "Overloaded product");
    for i in 0..11 {
        form = form.part("images", png_part(&format!("img-{}.png", i)));
    }

    let res = client
        .post(format!("{}/products", server.base_url))
        .multipart(form)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert!(
        body["error"].as_str().unwrap_or_default().contains("Too many files"),
        "body: {}",
        body
    );
    Ok(())
}

#[tokio::test]
async fn invalid_fields_report_every_violation() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let form = Form::new()
        .text("price", "not-a-number")
        .text("categoryIds", "[oops]");

    let res = client
        .post(format!("{}/products", server.base_url))
        .multipart(form)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    let paths: Vec<&str> = body["details"]
        .as_array()
        .expect("details")
        .iter()
        .filter_map(|d| d["path"].as_str())
        .collect();
    assert!(paths.contains(&"name"));
    assert!(paths.contains(&"price"));
    assert!(paths.contains(&"categoryIds"));
    Ok(())
}

#[tokio::test]
async fn disallowed_product_image_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let gif = Part::bytes(vec![0x47, 0x49, 0x46])
        .file_name("spin.gif")
        .mime_str("image/gif")?;
    let form = Form::new().text("name", "Gif product").part("images", gif);

    let res = client
        .post(format!("{}/products", server.base_url))
        .multipart(form)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn product_crud_with_resolved_categories() -> Result<()> {
    let server = common::ensure_server().await?;
    if !server.database_ready().await {
        eprintln!("skipping: database unavailable");
        return Ok(());
    }
    let client = reqwest::Client::new();

    // A category to link against
    let category_name = format!("Motors {}", common::unique_suffix());
    let res = client
        .post(format!("{}/categories", server.base_url))
        .multipart(
            Form::new()
                .text("name", category_name.clone())
                .text("description", "drive units"),
        )
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let category: Value = res.json().await?;
    let category_id = category["id"].as_i64().unwrap();

    // Create: string-typed form fields are coerced, links written atomically
    let form = Form::new()
        .text("name", "Borehole pump")
        .text("price", "1299.99")
        .text("showInHero", "true")
        .text("heroIndex", "3")
        .text("categoryIds", format!("[{}]", category_id))
        .text("machineData", r#"{"images":["/uploads/products/seed.png"],"flow":"40m3/h"}"#);
    let res = client
        .post(format!("{}/products", server.base_url))
        .multipart(form)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await?;
    let id = created["id"].as_i64().expect("numeric id");
    assert_eq!(created["price"], "1299.99");
    assert_eq!(created["isContactForPrice"], false);
    assert_eq!(created["showInHero"], true);
    assert_eq!(created["heroIndex"], 3);
    assert_eq!(created["categories"][0]["id"], category_id);

    // list() and getById() resolve the same category set
    let res = client
        .get(format!("{}/products/{}", server.base_url, id))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let fetched: Value = res.json().await?;
    assert_eq!(fetched["categories"], created["categories"]);

    let res = client.get(format!("{}/products", server.base_url)).send().await?;
    let all: Vec<Value> = res.json().await?;
    let listed = all.iter().find(|p| p["id"] == created["id"]).expect("listed");
    assert_eq!(listed["categories"], created["categories"]);

    // Partial update of price preserves untouched bag keys
    let res = client
        .put(format!("{}/products/{}", server.base_url, id))
        .multipart(Form::new().text("price", "999"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await?;
    assert_eq!(updated["price"], "999");
    assert_eq!(updated["machineData"]["flow"], "40m3/h");
    assert_eq!(
        updated["machineData"]["images"],
        serde_json::json!(["/uploads/products/seed.png"])
    );
    assert_eq!(updated["categories"], created["categories"]);

    // Bag patch overwrites supplied keys, keeps the rest
    let res = client
        .put(format!("{}/products/{}", server.base_url, id))
        .multipart(Form::new().text("machineData", r#"{"flow":"45m3/h"}"#))
        .send()
        .await?;
    let patched: Value = res.json().await?;
    assert_eq!(patched["machineData"]["flow"], "45m3/h");
    assert_eq!(
        patched["machineData"]["images"],
        serde_json::json!(["/uploads/products/seed.png"])
    );

    // Clearing price: present-but-empty field sets it to null
    let res = client
        .put(format!("{}/products/{}", server.base_url, id))
        .multipart(Form::new().text("price", "").text("isContactForPrice", "true"))
        .send()
        .await?;
    let cleared: Value = res.json().await?;
    assert!(cleared["price"].is_null());
    assert_eq!(cleared["isContactForPrice"], true);

    // Delete, then 404
    let res = client
        .delete(format!("{}/products/{}", server.base_url, id))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["success"], true);

    let res = client
        .get(format!("{}/products/{}", server.base_url, id))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn unknown_category_ids_are_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    if !server.database_ready().await {
        eprintln!("skipping: database unavailable");
        return Ok(());
    }
    let client = reqwest::Client::new();

    let form = Form::new()
        .text("name", "Orphan product")
        .text("categoryIds", "[999999999]");
    let res = client
        .post(format!("{}/products", server.base_url))
        .multipart(form)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert!(
        body["error"].as_str().unwrap_or_default().contains("Unknown category IDs"),
        "body: {}",
        body
    );
    Ok(())
}

#[tokio::test]
async fn link_and_unlink_categories() -> Result<()> {
    let server = common::ensure_server().await?;
    if !server.database_ready().await {
        eprintln!("skipping: database unavailable");
        return Ok(());
    }
    let client = reqwest::Client::new();

    let category_name = format!("Spares {}", common::unique_suffix());
    let res = client
        .post(format!("{}/categories", server.base_url))
        .multipart(Form::new().text("name", category_name).text("description", ""))
        .send()
        .await?;
    let category: Value = res.json().await?;
    let category_id = category["id"].as_i64().unwrap();

    let res = client
        .post(format!("{}/products", server.base_url))
        .multipart(Form::new().text("name", "Linkable product"))
        .send()
        .await?;
    let product: Value = res.json().await?;
    let id = product["id"].as_i64().unwrap();
    assert_eq!(product["categories"].as_array().unwrap().len(), 0);

    let res = client
        .post(format!(
            "{}/products/{}/categories/{}",
            server.base_url, id, category_id
        ))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let linked: Value = res.json().await?;
    assert_eq!(linked["categories"][0]["id"], category_id);

    // Linking twice is idempotent
    let res = client
        .post(format!(
            "{}/products/{}/categories/{}",
            server.base_url, id, category_id
        ))
        .send()
        .await?;
    let relinked: Value = res.json().await?;
    assert_eq!(relinked["categories"].as_array().unwrap().len(), 1);

    let res = client
        .delete(format!(
            "{}/products/{}/categories/{}",
            server.base_url, id, category_id
        ))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let unlinked: Value = res.json().await?;
    assert_eq!(unlinked["categories"].as_array().unwrap().len(), 0);
    Ok(())
}
