use actix_web::HttpRequest;
use chrono::NaiveDate;
use std::str::FromStr;

use centsible_common::models::budget::BudgetCategory;
use centsible_common::request_io::PageMeta;

use crate::env;
use crate::handlers::error::ServerError;

#[derive(Clone, Copy, Debug)]
pub struct PageParams {
    pub offset: i64,
    pub limit: i64,
}

/// Query parameters shared by the list endpoints. Repeated `category` keys
/// accumulate; everything else is last-one-wins. Unknown keys are ignored.
#[derive(Clone, Debug)]
pub struct ListParams {
    pub page: PageParams,
    pub categories: Option<Vec<BudgetCategory>>,
    pub month: Option<NaiveDate>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

fn query_pairs(query_string: &str) -> Result<Vec<(String, String)>, ServerError> {
    serde_urlencoded::from_str::<Vec<(String, String)>>(query_string)
        .map_err(|_| ServerError::InvalidFormat(Some(String::from("Query string is malformed"))))
}

fn parse_date(value: &str, key: &str) -> Result<NaiveDate, ServerError> {
    NaiveDate::from_str(value).map_err(|_| {
        ServerError::InvalidFormat(Some(format!(
            "'{key}' must be a date in the format YYYY-MM-DD"
        )))
    })
}

fn parse_count(value: &str, key: &str, minimum: i64) -> Result<i64, ServerError> {
    match value.parse::<i64>() {
        Ok(count) if count >= minimum => Ok(count),
        _ => Err(ServerError::InvalidFormat(Some(format!(
            "'{key}' must be an integer of at least {minimum}"
        )))),
    }
}

pub fn parse_list_params(req: &HttpRequest) -> Result<ListParams, ServerError> {
    let mut offset = env::CONF.pages.default_offset;
    let mut limit = env::CONF.pages.default_limit;
    let mut categories: Vec<BudgetCategory> = Vec::new();
    let mut month = None;
    let mut start = None;
    let mut end = None;

    for (key, value) in query_pairs(req.query_string())? {
        match key.as_str() {
            "offset" => offset = parse_count(&value, "offset", 0)?,
            "limit" => limit = parse_count(&value, "limit", 1)?,
            "category" => categories.push(BudgetCategory::from_str(&value).map_err(|_| {
                ServerError::InvalidFormat(Some(format!("Unrecognized category '{value}'")))
            })?),
            "month" => month = Some(parse_date(&value, "month")?),
            "start" => start = Some(parse_date(&value, "start")?),
            "end" => end = Some(parse_date(&value, "end")?),
            _ => (),
        }
    }

    Ok(ListParams {
        page: PageParams { offset, limit },
        categories: if categories.is_empty() {
            None
        } else {
            Some(categories)
        },
        month,
        start,
        end,
    })
}

/// Builds the `{total, prv, nxt}` metadata for a listing response. The
/// links are the request's own URL with `offset` moved one page in either
/// direction; `prv` is omitted on the first page and `nxt` on the last.
pub fn page_meta(req: &HttpRequest, page: PageParams, total: i64) -> PageMeta {
    let mut carried_pairs = query_pairs(req.query_string()).unwrap_or_default();
    carried_pairs.retain(|(key, _)| key != "offset" && key != "limit");

    let connection_info = req.connection_info();
    let base_url = format!(
        "{}://{}{}",
        connection_info.scheme(),
        connection_info.host(),
        req.path()
    );

    let link_for = |offset: i64| -> Option<String> {
        let mut pairs = carried_pairs.clone();
        pairs.push((String::from("offset"), offset.to_string()));
        pairs.push((String::from("limit"), page.limit.to_string()));

        match serde_urlencoded::to_string(&pairs) {
            Ok(query) => Some(format!("{base_url}?{query}")),
            Err(_) => None,
        }
    };

    let nxt = if page.offset + page.limit < total {
        link_for(page.offset + page.limit)
    } else {
        None
    };

    let prv = if page.offset > 0 {
        link_for((page.offset - page.limit).max(0))
    } else {
        None
    };

    PageMeta { total, prv, nxt }
}

#[cfg(test)]
mod tests {
    use super::*;

    use actix_web::test;

    #[actix_rt::test]
    async fn test_parse_list_params_accumulates_categories() {
        let req = test::TestRequest::get()
            .uri("/budgets?category=income&category=expenses")
            .to_http_request();

        let params = parse_list_params(&req).unwrap();

        assert_eq!(
            params.categories,
            Some(vec![BudgetCategory::Income, BudgetCategory::Expenses])
        );
        assert!(params.month.is_none());
    }

    #[actix_rt::test]
    async fn test_parse_list_params_rejects_unknown_category() {
        let req = test::TestRequest::get()
            .uri("/budgets?category=groceries")
            .to_http_request();

        assert!(matches!(
            parse_list_params(&req),
            Err(ServerError::InvalidFormat(_))
        ));
    }

    #[actix_rt::test]
    async fn test_parse_list_params_parses_dates_and_page() {
        let req = test::TestRequest::get()
            .uri("/transactions?start=2023-09-01&end=2023-09-30&offset=20&limit=10")
            .to_http_request();

        let params = parse_list_params(&req).unwrap();

        assert_eq!(params.start, NaiveDate::from_ymd_opt(2023, 9, 1));
        assert_eq!(params.end, NaiveDate::from_ymd_opt(2023, 9, 30));
        assert_eq!(params.page.offset, 20);
        assert_eq!(params.page.limit, 10);
    }

    #[actix_rt::test]
    async fn test_parse_list_params_rejects_bad_values() {
        let req = test::TestRequest::get()
            .uri("/budgets?month=September")
            .to_http_request();
        assert!(parse_list_params(&req).is_err());

        let req = test::TestRequest::get()
            .uri("/budgets?offset=-1")
            .to_http_request();
        assert!(parse_list_params(&req).is_err());

        let req = test::TestRequest::get()
            .uri("/budgets?limit=0")
            .to_http_request();
        assert!(parse_list_params(&req).is_err());
    }

    #[actix_rt::test]
    async fn test_page_meta_first_page() {
        let req = test::TestRequest::get()
            .uri("/budgets?category=income")
            .to_http_request();

        let meta = page_meta(&req, PageParams { offset: 0, limit: 2 }, 5);

        assert_eq!(meta.total, 5);
        assert!(meta.prv.is_none());

        let nxt = meta.nxt.unwrap();
        assert!(nxt.contains("/budgets?"));
        assert!(nxt.contains("category=income"));
        assert!(nxt.contains("offset=2"));
        assert!(nxt.contains("limit=2"));
    }

    #[actix_rt::test]
    async fn test_page_meta_middle_page_links_both_ways() {
        let req = test::TestRequest::get()
            .uri("/budgets?offset=2&limit=2")
            .to_http_request();

        let meta = page_meta(&req, PageParams { offset: 2, limit: 2 }, 6);

        assert!(meta.prv.unwrap().contains("offset=0"));
        assert!(meta.nxt.unwrap().contains("offset=4"));
    }

    #[actix_rt::test]
    async fn test_page_meta_last_page() {
        let req = test::TestRequest::get()
            .uri("/budgets?offset=4&limit=2")
            .to_http_request();

        let meta = page_meta(&req, PageParams { offset: 4, limit: 2 }, 5);

        assert!(meta.nxt.is_none());
        assert!(meta.prv.unwrap().contains("offset=2"));
    }

    #[actix_rt::test]
    async fn test_page_meta_single_page_has_no_links() {
        let req = test::TestRequest::get().uri("/budgets").to_http_request();

        let meta = page_meta(&req, PageParams { offset: 0, limit: 100 }, 3);

        assert_eq!(meta.total, 3);
        assert!(meta.prv.is_none());
        assert!(meta.nxt.is_none());
    }
}
