//! Query-string driven filtering, projection, sorting and pagination for list endpoints
use std::collections::HashMap;

use futures::StreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::Collection;
use serde::Serialize;

use crate::error::ErrorResponse;
use crate::utils::json::document_to_json;

const RESERVED: [&str; 4] = ["select", "sort", "page", "limit"];
const OPERATORS: [&str; 5] = ["gt", "gte", "lt", "lte", "in"];

pub const DEFAULT_LIMIT: i64 = 25;
pub const MAX_LIMIT: i64 = 100;
/// Largest page whose offset fits an i64 at any accepted limit
pub const MAX_PAGE: i64 = i64::MAX / MAX_LIMIT;

/// Related documents embedded into each listed document
#[derive(Debug, Clone, Copy)]
pub enum Populate {
    /// Every document of `from` whose `foreign_field` points back at this one
    Children {
        from: &'static str,
        foreign_field: &'static str,
        as_field: &'static str,
    },
    /// The document referenced by `local_field`, reduced to `fields`
    Parent {
        from: &'static str,
        local_field: &'static str,
        fields: &'static [&'static str],
    },
}

impl Populate {
    fn as_field(&self) -> &'static str {
        match self {
            Populate::Children { as_field, .. } => *as_field,
            Populate::Parent { local_field, .. } => *local_field,
        }
    }

    fn stages(&self) -> Vec<Document> {
        match *self {
            Populate::Children {
                from,
                foreign_field,
                as_field,
            } => vec![doc! {
                "$lookup": {
                    "from": from,
                    "localField": "_id",
                    "foreignField": foreign_field,
                    "as": as_field,
                }
            }],
            Populate::Parent {
                from,
                local_field,
                fields,
            } => {
                let mut projection = Document::new();
                for field in fields {
                    projection.insert(*field, 1);
                }
                vec![
                    doc! {
                        "$lookup": {
                            "from": from,
                            "localField": local_field,
                            "foreignField": "_id",
                            "as": local_field,
                            "pipeline": [ { "$project": projection } ],
                        }
                    },
                    doc! {
                        "$unwind": {
                            "path": format!("${}", local_field),
                            "preserveNullAndEmptyArrays": true,
                        }
                    },
                ]
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub filter: Document,
    pub projection: Option<Document>,
    pub sort: Document,
    pub page: i64,
    pub limit: i64,
}

impl ListQuery {
    /// Build a query from raw query-string pairs.
    ///
    /// `field[op]=value` becomes `{ field: { $op: value } }` for gt/gte/lt/lte/in;
    /// numeric and boolean literals are typed.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ErrorResponse> {
        let mut filter = Document::new();

        let mut keys: Vec<&String> = params.keys().collect();
        keys.sort();

        for key in keys {
            if RESERVED.contains(&key.as_str()) {
                continue;
            }
            let value = &params[key];
            let (field, operator) = split_operator(key)?;
            if field.is_empty() || field.starts_with('$') {
                return Err(ErrorResponse::bad_request(format!(
                    "Invalid filter field {}",
                    key
                )));
            }

            match operator {
                None => {
                    filter.insert(field, typed_value(value));
                }
                Some(op) => {
                    let bson = if op == "in" {
                        Bson::Array(value.split(',').map(|v| typed_value(v.trim())).collect())
                    } else {
                        typed_value(value)
                    };
                    let entry = filter
                        .entry(field.to_string())
                        .or_insert_with(|| Bson::Document(Document::new()));
                    match entry {
                        Bson::Document(ops) => {
                            ops.insert(format!("${}", op), bson);
                        }
                        _ => {
                            return Err(ErrorResponse::bad_request(format!(
                                "Conflicting filters for {}",
                                field
                            )))
                        }
                    }
                }
            }
        }

        let projection = params
            .get("select")
            .map(|select| {
                let mut projection = Document::new();
                for field in select.split(',').map(str::trim).filter(|f| !f.is_empty()) {
                    projection.insert(field, 1);
                }
                projection
            })
            .filter(|p| !p.is_empty());

        let sort = match params.get("sort") {
            Some(sort) if !sort.trim().is_empty() => {
                let mut doc = Document::new();
                for field in sort.split(',').map(str::trim).filter(|f| !f.is_empty()) {
                    let (name, direction) = match field.strip_prefix('-') {
                        Some(desc) => (desc.trim(), -1),
                        None => (field, 1),
                    };
                    if name.is_empty() {
                        return Err(ErrorResponse::bad_request(format!(
                            "Invalid sort field {}",
                            field
                        )));
                    }
                    doc.insert(name, direction);
                }
                doc
            }
            _ => doc! { "created_at": -1 },
        };

        let page = parse_positive(params.get("page"), "page")?.unwrap_or(1);
        if page > MAX_PAGE {
            return Err(ErrorResponse::bad_request(format!(
                "Query parameter page must not exceed {}",
                MAX_PAGE
            )));
        }
        let limit = parse_positive(params.get("limit"), "limit")?
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);

        Ok(Self {
            filter,
            projection,
            sort,
            page,
            limit,
        })
    }

    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit).max(0) as u64
    }

    /// Aggregation pipeline: match, sort, page, populate, then project
    pub fn pipeline(&self, populate: Option<Populate>) -> Vec<Document> {
        let mut pipeline = vec![
            doc! { "$match": self.filter.clone() },
            doc! { "$sort": self.sort.clone() },
            doc! { "$skip": self.skip() as i64 },
            doc! { "$limit": self.limit },
        ];

        if let Some(populate) = populate {
            pipeline.extend(populate.stages());
        }

        if let Some(projection) = &self.projection {
            let mut projection = projection.clone();
            if let Some(populate) = populate {
                projection.insert(populate.as_field(), 1);
            }
            pipeline.push(doc! { "$project": projection });
        }

        pipeline
    }

    pub fn pagination(&self, total: u64) -> Pagination {
        let start = self.page.saturating_sub(1).saturating_mul(self.limit);
        let end = self.page.saturating_mul(self.limit);

        Pagination {
            next: ((end as u64) < total).then(|| PageRef {
                page: self.page + 1,
                limit: self.limit,
            }),
            prev: (start > 0).then(|| PageRef {
                page: self.page - 1,
                limit: self.limit,
            }),
        }
    }
}

fn split_operator(key: &str) -> Result<(&str, Option<&str>), ErrorResponse> {
    match key.find('[') {
        None => Ok((key, None)),
        Some(open) => {
            let op = key[open + 1..]
                .strip_suffix(']')
                .filter(|op| OPERATORS.contains(op))
                .ok_or_else(|| {
                    ErrorResponse::bad_request(format!("Unsupported filter operator in {}", key))
                })?;
            Ok((&key[..open], Some(op)))
        }
    }
}

fn typed_value(raw: &str) -> Bson {
    match raw {
        "true" => return Bson::Boolean(true),
        "false" => return Bson::Boolean(false),
        _ => {}
    }
    // Keep zero-padded codes such as zipcodes as strings
    let zero_padded = raw.len() > 1 && raw.starts_with('0') && !raw.starts_with("0.");
    if !zero_padded {
        if let Ok(n) = raw.parse::<i64>() {
            return Bson::Int64(n);
        }
        if let Ok(f) = raw.parse::<f64>() {
            if f.is_finite() {
                return Bson::Double(f);
            }
        }
    }
    Bson::String(raw.to_string())
}

fn parse_positive(raw: Option<&String>, name: &str) -> Result<Option<i64>, ErrorResponse> {
    match raw {
        None => Ok(None),
        Some(v) => match v.trim().parse::<i64>() {
            Ok(n) if n >= 1 => Ok(Some(n)),
            _ => Err(ErrorResponse::bad_request(format!(
                "Query parameter {} must be a positive integer",
                name
            ))),
        },
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRef {
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageRef>,
}

/// `{ success, count, pagination, data }` body of list endpoints
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub count: usize,
    pub pagination: Pagination,
    pub data: Vec<serde_json::Value>,
}

/// Run a list query against `collection`
pub async fn fetch_list(
    collection: &Collection<Document>,
    query: &ListQuery,
    populate: Option<Populate>,
) -> Result<ListResponse, ErrorResponse> {
    let total = collection.count_documents(query.filter.clone()).await?;

    let mut cursor = collection.aggregate(query.pipeline(populate)).await?;
    let mut data = Vec::new();
    while let Some(doc) = cursor.next().await {
        data.push(document_to_json(doc?));
    }

    Ok(ListResponse {
        success: true,
        count: data.len(),
        pagination: query.pagination(total),
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let query = ListQuery::from_params(&HashMap::new()).unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, DEFAULT_LIMIT);
        assert_eq!(query.skip(), 0);
        assert_eq!(query.sort, doc! { "created_at": -1 });
        assert!(query.filter.is_empty());
        assert!(query.projection.is_none());
    }

    #[test]
    fn test_operators_and_typed_values() {
        let query = ListQuery::from_params(&params(&[
            ("average_cost[lte]", "10000"),
            ("average_cost[gt]", "99.5"),
            ("housing", "true"),
            ("careers[in]", "Business,UI/UX"),
            ("location.zipcode", "02215"),
        ]))
        .unwrap();

        assert_eq!(
            query.filter.get_document("average_cost").unwrap(),
            &doc! { "$gt": 99.5, "$lte": 10000_i64 }
        );
        assert_eq!(query.filter.get_bool("housing").unwrap(), true);
        assert_eq!(
            query.filter.get_document("careers").unwrap(),
            &doc! { "$in": ["Business", "UI/UX"] }
        );
        assert_eq!(query.filter.get_str("location.zipcode").unwrap(), "02215");
    }

    #[test]
    fn test_unknown_operator_rejected() {
        let err = ListQuery::from_params(&params(&[("name[regex]", ".*")])).unwrap_err();
        assert_eq!(err.status, actix_web::http::StatusCode::BAD_REQUEST);

        assert!(ListQuery::from_params(&params(&[("$where", "1")])).is_err());
    }

    #[test]
    fn test_select_sort_and_paging() {
        let query = ListQuery::from_params(&params(&[
            ("select", "name,description"),
            ("sort", "-average_cost,name"),
            ("page", "3"),
            ("limit", "2"),
        ]))
        .unwrap();

        assert_eq!(query.projection, Some(doc! { "name": 1, "description": 1 }));
        assert_eq!(query.sort, doc! { "average_cost": -1, "name": 1 });
        assert_eq!(query.skip(), 4);

        let pagination = query.pagination(10);
        assert_eq!(pagination.next, Some(PageRef { page: 4, limit: 2 }));
        assert_eq!(pagination.prev, Some(PageRef { page: 2, limit: 2 }));

        let last = query.pagination(6);
        assert!(last.next.is_none());
    }

    #[test]
    fn test_limit_is_capped_and_validated() {
        let query = ListQuery::from_params(&params(&[("limit", "1000")])).unwrap();
        assert_eq!(query.limit, MAX_LIMIT);

        assert!(ListQuery::from_params(&params(&[("page", "0")])).is_err());
        assert!(ListQuery::from_params(&params(&[("limit", "abc")])).is_err());
    }

    #[test]
    fn test_huge_page_is_rejected() {
        let huge = i64::MAX.to_string();
        let err = ListQuery::from_params(&params(&[("page", huge.as_str())])).unwrap_err();
        assert_eq!(err.status, actix_web::http::StatusCode::BAD_REQUEST);

        let max_page = MAX_PAGE.to_string();
        let last =
            ListQuery::from_params(&params(&[("page", max_page.as_str()), ("limit", "100")])).unwrap();
        assert_eq!(last.skip(), ((MAX_PAGE - 1) * MAX_LIMIT) as u64);
        let pagination = last.pagination(10);
        assert!(pagination.next.is_none());
        assert_eq!(pagination.prev.map(|p| p.page), Some(MAX_PAGE - 1));

        // Built directly, offsets saturate instead of overflowing
        let raw = ListQuery {
            page: i64::MAX,
            limit: MAX_LIMIT,
            ..ListQuery::from_params(&HashMap::new()).unwrap()
        };
        assert_eq!(raw.skip(), i64::MAX as u64);
        assert!(raw.pagination(10).next.is_none());
    }

    #[test]
    fn test_empty_sort_field_rejected() {
        for sort in ["-", "name,-", "name, - "] {
            let err = ListQuery::from_params(&params(&[("sort", sort)])).unwrap_err();
            assert_eq!(err.status, actix_web::http::StatusCode::BAD_REQUEST, "sort={}", sort);
        }

        let query = ListQuery::from_params(&params(&[("sort", "name,,-weeks")])).unwrap();
        assert_eq!(query.sort, doc! { "name": 1, "weeks": -1 });
    }

    #[test]
    fn test_pipeline_keeps_populated_field_in_projection() {
        let query = ListQuery::from_params(&params(&[("select", "title")])).unwrap();
        let pipeline = query.pipeline(Some(Populate::Parent {
            from: "bootcamps",
            local_field: "bootcamp",
            fields: &["name", "description"],
        }));

        assert_eq!(pipeline.len(), 7);
        assert!(pipeline[4].contains_key("$lookup"));
        assert!(pipeline[5].contains_key("$unwind"));
        assert_eq!(
            pipeline[6],
            doc! { "$project": { "title": 1, "bootcamp": 1 } }
        );
    }
}
