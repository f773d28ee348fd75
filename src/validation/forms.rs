// Typed forms built from multipart text fields.

use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::{
    check_description, check_name, coerce_bool, coerce_i32, parse_id_list, parse_json_object,
    parse_price, ValidationErrors,
};

/// Text fields collected from a multipart request, keyed by field name
pub type FormFields = HashMap<String, String>;

fn get<'a>(fields: &'a FormFields, key: &str) -> Option<&'a str> {
    fields.get(key).map(String::as_str)
}

#[derive(Debug, Clone)]
pub struct CategoryCreate {
    pub name: String,
    pub description: String,
}

impl CategoryCreate {
    pub fn from_fields(fields: &FormFields) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_name(&mut errors, "name", get(fields, "name"));
        check_description(&mut errors, "description", get(fields, "description"));
        errors.into_result()?;

        Ok(Self {
            name: get(fields, "name").unwrap_or_default().trim().to_string(),
            description: get(fields, "description").unwrap_or_default().to_string(),
        })
    }
}

/// Partial category update; absent fields stay untouched
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl CategoryUpdate {
    pub fn from_fields(fields: &FormFields) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if fields.contains_key("name") {
            check_name(&mut errors, "name", get(fields, "name"));
        }
        check_description(&mut errors, "description", get(fields, "description"));
        errors.into_result()?;

        Ok(Self {
            name: get(fields, "name").map(|v| v.trim().to_string()),
            description: get(fields, "description").map(str::to_string),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ProductCreate {
    pub name: String,
    pub price: Option<Decimal>,
    pub is_contact_for_price: bool,
    pub description: String,
    pub machine_data: Map<String, Value>,
    pub show_in_hero: bool,
    pub hero_index: i32,
    pub category_ids: Vec<i64>,
}

impl ProductCreate {
    pub fn from_fields(fields: &FormFields) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_name(&mut errors, "name", get(fields, "name"));
        check_description(&mut errors, "description", get(fields, "description"));
        let price = parse_price(&mut errors, "price", get(fields, "price"));
        let machine_data =
            parse_json_object(&mut errors, "machineData", get(fields, "machineData"))
                .unwrap_or_default();
        let category_ids =
            parse_id_list(&mut errors, "categoryIds", get(fields, "categoryIds"))
                .unwrap_or_default();
        errors.into_result()?;

        Ok(Self {
            name: get(fields, "name").unwrap_or_default().trim().to_string(),
            price,
            is_contact_for_price: coerce_bool(get(fields, "isContactForPrice"), false),
            description: get(fields, "description").unwrap_or_default().to_string(),
            machine_data,
            show_in_hero: coerce_bool(get(fields, "showInHero"), false),
            hero_index: coerce_i32(get(fields, "heroIndex"), 0),
            category_ids,
        })
    }
}

/// Partial product update; absent fields stay untouched. A present-but-empty
/// `price` clears the stored price.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub price: Option<Option<Decimal>>,
    pub is_contact_for_price: Option<bool>,
    pub description: Option<String>,
    /// Shallow-merged onto the existing attribute bag
    pub machine_data: Option<Map<String, Value>>,
    pub show_in_hero: Option<bool>,
    pub hero_index: Option<i32>,
    /// Replaces the full set of category links when present
    pub category_ids: Option<Vec<i64>>,
}

impl ProductUpdate {
    pub fn from_fields(fields: &FormFields) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if fields.contains_key("name") {
            check_name(&mut errors, "name", get(fields, "name"));
        }
        check_description(&mut errors, "description", get(fields, "description"));

        let price = if fields.contains_key("price") {
            Some(parse_price(&mut errors, "price", get(fields, "price")))
        } else {
            None
        };
        let machine_data =
            parse_json_object(&mut errors, "machineData", get(fields, "machineData"));
        let category_ids = parse_id_list(&mut errors, "categoryIds", get(fields, "categoryIds"));
        errors.into_result()?;

        Ok(Self {
            name: get(fields, "name").map(|v| v.trim().to_string()),
            price,
            is_contact_for_price: get(fields, "isContactForPrice")
                .map(|v| coerce_bool(Some(v), false)),
            description: get(fields, "description").map(str::to_string),
            machine_data,
            show_in_hero: get(fields, "showInHero").map(|v| coerce_bool(Some(v), false)),
            hero_index: get(fields, "heroIndex").map(|v| coerce_i32(Some(v), 0)),
            category_ids,
        })
    }
}
