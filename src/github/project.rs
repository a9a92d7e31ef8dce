//! Projects (v2) single-select field operations.

use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};

use super::client::{GraphqlClient, GraphqlError};
use crate::priority::Priority;

const UPDATE_FIELD_MUTATION: &str = r#"
mutation UpdateProjectItemField($input: UpdateProjectV2ItemFieldValueInput!) {
  updateProjectV2ItemFieldValue(input: $input) {
    clientMutationId
  }
}
"#;

const PRIORITY_IDS_QUERY: &str = r#"
query ProjectPriorityIds($project: ID!, $field: String!, $after: String) {
  node(id: $project) {
    ... on ProjectV2 {
      field(name: $field) {
        ... on ProjectV2SingleSelectField {
          id
          options { id name }
        }
      }
      items(first: 100, after: $after) {
        pageInfo { hasNextPage endCursor }
        nodes {
          id
          content {
            ... on Issue {
              number
              repository { url }
            }
          }
        }
      }
    }
  }
}
"#;

/// `UpdateProjectV2ItemFieldValueInput` for a single-select value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValueInput<'a> {
    pub project_id: &'a str,
    pub item_id: &'a str,
    pub field_id: &'a str,
    pub value: SingleSelectValue<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleSelectValue<'a> {
    pub single_select_option_id: &'a str,
}

impl<'a> FieldValueInput<'a> {
    pub fn new(project_id: &'a str, item_id: &'a str, field_id: &'a str, option_id: &'a str) -> Self {
        Self {
            project_id,
            item_id,
            field_id,
            value: SingleSelectValue {
                single_select_option_id: option_id,
            },
        }
    }

    pub fn variables(&self) -> serde_json::Value {
        serde_json::json!({ "input": self })
    }
}

/// The board operations the mutation driver relies on.
pub trait ProjectApi {
    fn update_single_select(&self, input: &FieldValueInput<'_>) -> Result<(), GraphqlError>;
}

impl ProjectApi for GraphqlClient {
    fn update_single_select(&self, input: &FieldValueInput<'_>) -> Result<(), GraphqlError> {
        tracing::debug!(item = input.item_id, option = input.value.single_select_option_id, "updating field");
        self.graphql_query(UPDATE_FIELD_MUTATION, input.variables())?;
        Ok(())
    }
}

/// Identifiers looked up live from the board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedIds {
    pub field_id: String,
    pub options: BTreeMap<Priority, String>,
    pub items: BTreeMap<u64, String>,
}

#[derive(Debug, Deserialize)]
struct IdsData {
    node: Option<ProjectNode>,
}

#[derive(Debug, Deserialize)]
struct ProjectNode {
    field: Option<SingleSelectField>,
    items: Option<ItemConnection>,
}

#[derive(Debug, Deserialize)]
struct SingleSelectField {
    id: Option<String>,
    #[serde(default)]
    options: Vec<FieldOption>,
}

#[derive(Debug, Deserialize)]
struct FieldOption {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemConnection {
    page_info: PageInfo,
    #[serde(default)]
    nodes: Vec<Option<ItemNode>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemNode {
    id: String,
    content: Option<ItemContent>,
}

#[derive(Debug, Deserialize)]
struct ItemContent {
    number: Option<u64>,
    repository: Option<RepositoryRef>,
}

#[derive(Debug, Deserialize)]
struct RepositoryRef {
    url: String,
}

impl ItemContent {
    /// Issue number, if this item is an issue of `repository_url`.
    fn issue_in(&self, repository_url: &str) -> Option<u64> {
        let repository = self.repository.as_ref()?;
        same_repository(&repository.url, repository_url).then_some(self.number?)
    }
}

fn same_repository(a: &str, b: &str) -> bool {
    a.trim_end_matches('/')
        .eq_ignore_ascii_case(b.trim_end_matches('/'))
}

/// Where to look up identifiers.
#[derive(Debug, Clone, Copy)]
pub struct ResolveTarget<'a> {
    pub project_id: &'a str,
    pub field_name: &'a str,
    /// Only issues of this repository are mapped; boards may mix repositories.
    pub repository_url: &'a str,
}

/// Looks up the field, its options and every item on the board that is an
/// issue of the target repository.
pub fn resolve_ids(client: &GraphqlClient, target: ResolveTarget<'_>) -> Result<ResolvedIds> {
    let ResolveTarget {
        project_id,
        field_name,
        ..
    } = target;
    let mut resolved = ResolvedIds::default();
    let mut after: Option<String> = None;

    loop {
        let vars = serde_json::json!({
            "project": project_id,
            "field": field_name,
            "after": after,
        });
        let response = client
            .graphql_query(PRIORITY_IDS_QUERY, vars)
            .with_context(|| format!("querying identifiers of project {project_id}"))?;
        let page = decode_page(response)?;
        let more = absorb_page(&mut resolved, page, target)?;
        match more {
            Some(cursor) => after = Some(cursor),
            None => break,
        }
    }

    tracing::debug!(
        options = resolved.options.len(),
        items = resolved.items.len(),
        "resolved project identifiers"
    );
    Ok(resolved)
}

fn decode_page(mut response: serde_json::Value) -> Result<IdsData> {
    let data = response
        .get_mut("data")
        .map(serde_json::Value::take)
        .ok_or_else(|| anyhow!("No data returned."))?;
    serde_json::from_value(data).context("decoding project identifiers")
}

/// Folds one page into `resolved`; returns the cursor of the next page.
fn absorb_page(
    resolved: &mut ResolvedIds,
    page: IdsData,
    target: ResolveTarget<'_>,
) -> Result<Option<String>> {
    let ResolveTarget {
        project_id,
        field_name,
        repository_url,
    } = target;
    let Some(node) = page.node else {
        bail!("project `{project_id}` was not found");
    };

    if resolved.field_id.is_empty() {
        let field = node
            .field
            .ok_or_else(|| anyhow!("project has no field named `{field_name}`"))?;
        let Some(field_id) = field.id else {
            bail!("field `{field_name}` is not a single-select field");
        };
        resolved.field_id = field_id;
        for option in field.options {
            match option.name.parse::<Priority>() {
                Ok(priority) => {
                    resolved.options.insert(priority, option.id);
                }
                Err(_) => tracing::debug!(name = %option.name, "ignoring unknown option"),
            }
        }
    }

    let Some(items) = node.items else {
        return Ok(None);
    };
    for item in items.nodes.into_iter().flatten() {
        let Some(content) = item.content else {
            continue;
        };
        match content.issue_in(repository_url) {
            Some(number) => {
                resolved.items.insert(number, item.id);
            }
            None => tracing::trace!(item = %item.id, "skipping item outside the repository"),
        }
    }

    if items.page_info.has_next_page {
        Ok(items.page_info.end_cursor)
    } else {
        Ok(None)
    }
}
