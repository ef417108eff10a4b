use crate::domain::error::WizardError;
use crate::domain::model::Quote;
use crate::domain::traits::QuoteProvider;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

// Naver mobile stock API, `/{code}/basic`
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
struct NaverBasic {
    stock_name: Option<String>,
    close_price: Option<String>,
    compare_to_previous_close_price: Option<String>,
    fluctuations_ratio: Option<String>,
}

/// Quote lookup against Naver Finance.
pub struct NaverQuoteClient {
    client: Client,
    endpoint: String,
}

impl NaverQuoteClient {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl QuoteProvider for NaverQuoteClient {
    async fn lookup(&self, code: &str) -> Result<Option<Quote>, WizardError> {
        let url = format!("{}/{}/basic", self.endpoint, code);
        let response = self.client.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let basic = response.error_for_status()?.json::<NaverBasic>().await?;
        Ok(parse_basic(code, basic))
    }
}

fn parse_basic(code: &str, basic: NaverBasic) -> Option<Quote> {
    let name = basic.stock_name?.trim().to_string();
    let price = parse_number(basic.close_price.as_deref()?)? as i64;

    Some(Quote {
        code: code.to_string(),
        name,
        price,
        change_amount: basic
            .compare_to_previous_close_price
            .as_deref()
            .and_then(parse_number)
            .unwrap_or(0.0) as i64,
        change_rate: basic
            .fluctuations_ratio
            .as_deref()
            .and_then(parse_number)
            .unwrap_or(0.0),
    })
}

// "71,000" / "-1.25"
fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', "").trim().parse().ok()
}

/// Used when quote lookups are disabled.
pub struct NoQuotes;

#[async_trait]
impl QuoteProvider for NoQuotes {
    async fn lookup(&self, _code: &str) -> Result<Option<Quote>, WizardError> {
        Ok(None)
    }
}
