//! @ai:module:intent Parse `@sloth service` directive groups into service declarations
//! @ai:module:layer domain
//! @ai:module:public_api eval_service, parse_service
//! @ai:module:depends_on lexer, tree, specification
//! @ai:module:stateless true

use super::lexer::{classify, DirectiveGroup, DirectiveKind};
use super::tree::{self, Node};
use super::{DirectiveError, Outcome};
use crate::specification::{
    Labels, ServiceDeclaration, DEFAULT_SERVICE_VERSION, SERVICE_VERSION_LABEL,
};

/// @ai:intent Run the service grammar over one comment block
/// @ai:post Skip when the block holds no service group
/// @ai:post when several service groups are present the last one is returned
/// @ai:effects pure
pub fn eval_service(block: &str) -> Outcome<ServiceDeclaration> {
    let classification = classify(block);
    let mut declared = None;

    for group in classification.groups(DirectiveKind::Service) {
        match parse_service(group) {
            Ok(service) => declared = Some(service),
            Err(e) => return Outcome::Failure(e),
        }
    }

    match declared {
        Some(service) => Outcome::Success(service),
        None => Outcome::Skip,
    }
}

/// @ai:intent Parse one service group
/// @ai:pre group.kind is Service
/// @ai:example ("@sloth service checkout\n  version: 1.2") -> checkout 1.2
/// @ai:effects pure
pub fn parse_service(group: &DirectiveGroup<'_>) -> Result<ServiceDeclaration, DirectiveError> {
    let marker_line = group.span.start;
    let body = tree::parse(&group.body)?;
    if let Node::List(_) = body {
        return Err(DirectiveError::malformed(
            marker_line,
            "service directive expects `key: value` fields, found a list",
        ));
    }

    let mut name = group.argument.map(str::to_string);
    let mut version = None;
    let mut labels = Labels::new();

    for entry in body.entries(marker_line, "service")? {
        match entry.key.as_str() {
            "name" => {
                if name.is_some() {
                    return Err(DirectiveError::DuplicateKeyInEntry {
                        line: entry.line,
                        key: entry.key.clone(),
                    });
                }
                name = entry.scalar()?.map(str::to_string);
            }
            "version" => version = entry.scalar()?.map(str::to_string),
            "labels" => {
                labels = entry.value.to_string_map(entry.line, "labels")?;
                if labels.contains_key(SERVICE_VERSION_LABEL) {
                    return Err(DirectiveError::malformed(
                        entry.line,
                        format!("label `{SERVICE_VERSION_LABEL}` is reserved, use `version`"),
                    ));
                }
            }
            other => tracing::debug!(key = other, "Ignoring unknown service field"),
        }
    }

    let name = name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| DirectiveError::missing(marker_line, "name"))?;

    Ok(ServiceDeclaration {
        name,
        version: version.unwrap_or_else(|| DEFAULT_SERVICE_VERSION.to_string()),
        labels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::FailureKind;
    use pretty_assertions::assert_eq;

    fn success(block: &str) -> ServiceDeclaration {
        match eval_service(block) {
            Outcome::Success(service) => service,
            other => panic!("expected a service, got {:?}", other),
        }
    }

    fn failure(block: &str) -> DirectiveError {
        match eval_service(block) {
            Outcome::Failure(e) => e,
            other => panic!("expected a failure, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_full_service() {
        let service =
            success("@sloth service\n  name: checkout\n  version: 1.2\n  labels:\n    team: payments");

        let mut labels = Labels::new();
        labels.insert("team".to_string(), "payments".to_string());
        assert_eq!(
            service,
            ServiceDeclaration {
                name: "checkout".to_string(),
                version: "1.2".to_string(),
                labels,
            }
        );
    }

    #[test]
    fn test_inline_name_and_default_version() {
        let service = success("@sloth.service checkout");
        assert_eq!(service, ServiceDeclaration::new("checkout"));
        assert_eq!(service.version, DEFAULT_SERVICE_VERSION);
    }

    #[test]
    fn test_plain_comment_is_skipped() {
        assert!(eval_service("Package checkout implements the payment flow.").is_skip());
    }

    #[test]
    fn test_slo_group_is_not_a_service() {
        assert!(eval_service("@sloth slos\n  - name: a\n    objective: 99").is_skip());
    }

    #[test]
    fn test_missing_name() {
        let err = failure("@sloth service\n  version: 1.2");
        assert_eq!(err.kind(), FailureKind::MissingRequiredField);
        assert_eq!(err.line(), 0);
    }

    #[test]
    fn test_empty_name_is_missing() {
        let err = failure("@sloth service\n  name:");
        assert_eq!(err.kind(), FailureKind::MissingRequiredField);
    }

    #[test]
    fn test_inline_and_body_name_conflict() {
        let err = failure("@sloth service checkout\n  name: billing");
        assert_eq!(err.kind(), FailureKind::DuplicateKeyInEntry);
        assert_eq!(err.line(), 1);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let service = success("@sloth service checkout\n  owner: team-a\n  tier:\n    level: 1");
        assert_eq!(service.name, "checkout");
    }

    #[test]
    fn test_service_version_label_is_reserved() {
        let err = failure("@sloth service checkout\n  labels:\n    service_version: 2");
        assert_eq!(err.kind(), FailureKind::MalformedDirective);
        assert_eq!(err.line(), 1);
    }

    #[test]
    fn test_labels_must_be_a_map() {
        let err = failure("@sloth service checkout\n  labels: team");
        assert_eq!(err.kind(), FailureKind::MalformedDirective);
    }

    #[test]
    fn test_last_service_group_in_block_wins() {
        let service = success("@sloth service first\n\n@sloth service second");
        assert_eq!(service.name, "second");
    }
}
