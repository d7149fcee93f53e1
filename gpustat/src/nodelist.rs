//! Expansion of SLURM node-list expressions into individual node names.
//!
//! SLURM tools emit compact lists like `node[001-003,007],gpu-node042`.
//! A bracketed group holds comma-separated subspecs, each either a literal
//! suffix or a `start-end` numeric range whose zero-padding width is the
//! width of `start`. Brackets are never nested.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NodeListError {
    #[error("unbalanced brackets in node list '{0}'")]
    UnbalancedBrackets(String),
    #[error("invalid numeric range '{range}' in node spec '{spec}'")]
    InvalidRange { spec: String, range: String },
}

/// Split a node-list expression at top-level commas only. Commas inside a
/// bracketed group never split.
pub fn split_node_list(expr: &str) -> Result<Vec<&str>, NodeListError> {
    let expr = expr.trim();
    let mut specs = Vec::new();
    let mut depth = 0u32;
    let mut start = 0;
    for (idx, ch) in expr.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| NodeListError::UnbalancedBrackets(expr.to_string()))?;
            }
            ',' if depth == 0 => {
                specs.push(&expr[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(NodeListError::UnbalancedBrackets(expr.to_string()));
    }
    specs.push(&expr[start..]);
    specs.retain(|spec| !spec.is_empty());
    Ok(specs)
}

/// Expand one node spec into node names, in ascending range order.
///
/// A spec without brackets is a single literal name. `prefix[a,b-c]`
/// yields `prefixa` plus the zero-padded names `prefixb` through
/// `prefixc`. An empty group expands to nothing.
pub fn expand_node_spec(spec: &str) -> Result<Vec<String>, NodeListError> {
    let Some(head) = spec.find('[') else {
        return Ok(vec![spec.to_string()]);
    };
    let tail = spec
        .find(']')
        .filter(|tail| *tail > head)
        .ok_or_else(|| NodeListError::UnbalancedBrackets(spec.to_string()))?;
    let prefix = &spec[..head];
    let mut names = Vec::new();
    for subspec in spec[head + 1..tail].split(',') {
        if subspec.is_empty() {
            continue;
        }
        match subspec.split_once('-') {
            None => names.push(format!("{prefix}{subspec}")),
            Some((first, last)) => {
                let width = first.len();
                let first: u64 = first.parse().map_err(|_| invalid_range(spec, subspec))?;
                let last: u64 = last.parse().map_err(|_| invalid_range(spec, subspec))?;
                for x in first..=last {
                    names.push(format!("{prefix}{x:0width$}"));
                }
            }
        }
    }
    Ok(names)
}

/// Parse a full node-list expression into individual node names,
/// preserving order (and duplicates, should the scheduler emit any).
pub fn parse_node_names(expr: &str) -> Result<Vec<String>, NodeListError> {
    let mut names = Vec::new();
    for spec in split_node_list(expr)? {
        names.extend(expand_node_spec(spec)?);
    }
    Ok(names)
}

fn invalid_range(spec: &str, range: &str) -> NodeListError {
    NodeListError::InvalidRange {
        spec: spec.to_string(),
        range: range.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_only_at_top_level_commas() {
        let specs = split_node_list("a[1,2],b[3,4]").unwrap();
        assert_eq!(specs, vec!["a[1,2]", "b[3,4]"]);
    }

    #[test]
    fn split_keeps_bare_names_alongside_groups() {
        let specs = split_node_list("node[001-002],node004").unwrap();
        assert_eq!(specs, vec!["node[001-002]", "node004"]);
    }

    #[test]
    fn split_of_empty_expression_is_empty() {
        assert_eq!(split_node_list("").unwrap(), Vec::<&str>::new());
    }

    #[test]
    fn literal_spec_passes_through_unchanged() {
        assert_eq!(expand_node_spec("gpu-node042").unwrap(), vec!["gpu-node042"]);
    }

    #[test]
    fn expands_simple_range() {
        assert_eq!(
            parse_node_names("node[001-003]").unwrap(),
            vec!["node001", "node002", "node003"]
        );
    }

    #[test]
    fn expands_range_and_literal_mix() {
        assert_eq!(
            parse_node_names("node[001-002],node004").unwrap(),
            vec!["node001", "node002", "node004"]
        );
    }

    #[test]
    fn preserves_zero_padding_width_of_range_start() {
        assert_eq!(parse_node_names("x[01-03]").unwrap(), vec!["x01", "x02", "x03"]);
        assert_eq!(parse_node_names("x[8-10]").unwrap(), vec!["x8", "x9", "x10"]);
    }

    #[test]
    fn expands_mixed_subspecs_within_one_group() {
        assert_eq!(
            parse_node_names("node[1-3,7],gpu-node042").unwrap(),
            vec!["node1", "node2", "node3", "node7", "gpu-node042"]
        );
    }

    #[test]
    fn single_element_range_yields_one_name() {
        assert_eq!(parse_node_names("n[05-05]").unwrap(), vec!["n05"]);
    }

    #[test]
    fn empty_group_expands_to_nothing_without_breaking_neighbours() {
        assert_eq!(parse_node_names("a[],b").unwrap(), vec!["b"]);
    }

    #[test]
    fn keeps_duplicates_and_order() {
        assert_eq!(
            parse_node_names("n1,n[1-2],n1").unwrap(),
            vec!["n1", "n1", "n2", "n1"]
        );
    }

    #[test]
    fn rejects_unbalanced_open_bracket() {
        let err = parse_node_names("a[1,2").unwrap_err();
        assert_eq!(err, NodeListError::UnbalancedBrackets("a[1,2".to_string()));
    }

    #[test]
    fn rejects_unbalanced_close_bracket() {
        assert!(matches!(
            parse_node_names("a1,2]").unwrap_err(),
            NodeListError::UnbalancedBrackets(_)
        ));
    }

    #[test]
    fn rejects_non_numeric_range_endpoints() {
        assert!(matches!(
            parse_node_names("a[x-3]").unwrap_err(),
            NodeListError::InvalidRange { .. }
        ));
    }
}
