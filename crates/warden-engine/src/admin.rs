//! Administrative command surface.
//!
//! One serializable command enum covering every mutation an operator can
//! make at runtime, so console, RPC, and script frontends all funnel
//! through the same validation and the same persistence behavior.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use warden_rbac::{PermNode, PermissionDecision};
use warden_zones::{Override, Subject, Zone, ZoneBounds};

use crate::engine::{EngineError, EngineResult, PermissionEngine};
use crate::promote::PromotionRule;

/// An administrative mutation or query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum AdminCommand {
    /// Create a custom zone.
    CreateZone {
        name: String,
        parent: String,
        #[serde(default)]
        world: Option<String>,
        #[serde(default)]
        bounds: Option<ZoneBounds>,
    },
    /// Delete a custom zone and its persisted state.
    DeleteZone { name: String },
    /// Move a custom zone under a new parent.
    SetParent { name: String, parent: String },
    /// Record an allow/deny override in a zone.
    SetOverride {
        zone: String,
        subject: Subject,
        node: String,
        state: Override,
    },
    /// Remove an override, restoring "unset".
    ClearOverride {
        zone: String,
        subject: Subject,
        node: String,
    },
    /// Record a stored value in a zone.
    SetValue {
        zone: String,
        subject: Subject,
        node: String,
        value: String,
    },
    /// Remove a stored value.
    ClearValue {
        zone: String,
        subject: Subject,
        node: String,
    },
    /// Attach a promotion rule to a zone.
    SetRule { zone: String, rule: PromotionRule },
    /// Detach a zone's promotion rule.
    RemoveRule { zone: String },
    /// Resolve a node for an actor in a zone.
    QueryEffective {
        actor: Uuid,
        node: String,
        zone: String,
    },
}

/// The outcome of an executed command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result", content = "data", rename_all = "snake_case")]
pub enum AdminResponse {
    /// The zone created.
    Zone(Zone),
    /// Mutation applied.
    Applied,
    /// Clear or remove outcome: whether anything was there.
    Removed(bool),
    /// Resolution outcome for a query.
    Decision(PermissionDecision),
}

impl AdminCommand {
    /// Validate and apply the command against the engine.
    ///
    /// Mutations that change durable state persist it immediately, so an
    /// unclean exit after an admin edit loses nothing.
    pub async fn execute(self, engine: &PermissionEngine) -> EngineResult<AdminResponse> {
        match self {
            Self::CreateZone {
                name,
                parent,
                world,
                bounds,
            } => {
                let zone =
                    engine
                        .zones()
                        .create_zone(&name, &parent, world.as_deref(), bounds)?;
                engine.save_zones().await?;
                Ok(AdminResponse::Zone(zone))
            }
            Self::DeleteZone { name } => {
                engine.delete_zone(&name).await?;
                Ok(AdminResponse::Applied)
            }
            Self::SetParent { name, parent } => {
                engine.zones().set_parent(&name, &parent)?;
                engine.save_zones().await?;
                Ok(AdminResponse::Applied)
            }
            Self::SetOverride {
                zone,
                subject,
                node,
                state,
            } => {
                let node = parse_node(&node)?;
                engine.zones().set_override(&zone, subject, &node, state)?;
                engine.save_zones().await?;
                Ok(AdminResponse::Applied)
            }
            Self::ClearOverride {
                zone,
                subject,
                node,
            } => {
                let node = parse_node(&node)?;
                let removed = engine.zones().clear_override(&zone, subject, &node)?;
                engine.save_zones().await?;
                Ok(AdminResponse::Removed(removed))
            }
            Self::SetValue {
                zone,
                subject,
                node,
                value,
            } => {
                let node = parse_node(&node)?;
                engine.zones().set_value(&zone, subject, &node, value)?;
                engine.save_zones().await?;
                Ok(AdminResponse::Applied)
            }
            Self::ClearValue {
                zone,
                subject,
                node,
            } => {
                let node = parse_node(&node)?;
                let removed = engine.zones().clear_value(&zone, subject, &node)?;
                engine.save_zones().await?;
                Ok(AdminResponse::Removed(removed))
            }
            Self::SetRule { zone, rule } => {
                engine.promoter().set_rule(&zone, rule)?;
                engine.save_promotion_record(&zone).await?;
                Ok(AdminResponse::Applied)
            }
            Self::RemoveRule { zone } => {
                let removed = engine.promoter().remove_rule(&zone);
                engine.save_promotion_record(&zone).await?;
                Ok(AdminResponse::Removed(removed))
            }
            Self::QueryEffective { actor, node, zone } => {
                let node = parse_node(&node)?;
                let decision = engine.resolver().resolve_in(actor, &node, &zone);
                Ok(AdminResponse::Decision(decision))
            }
        }
    }
}

fn parse_node(raw: &str) -> EngineResult<PermNode> {
    PermNode::parse(raw).ok_or_else(|| EngineError::InvalidNode(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use warden_rbac::{GroupTier, RegistryBuilder};
    use warden_store::MemoryStore;

    fn engine() -> PermissionEngine {
        let mut builder = RegistryBuilder::new();
        builder
            .register(PermNode::parse("build.place").unwrap(), GroupTier::Default)
            .unwrap();
        PermissionEngine::new(builder.build(), Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_create_override_query() {
        let engine = engine();
        let world = engine.zones().define_world("overworld").unwrap();
        let actor = Uuid::now_v7();

        let response = AdminCommand::CreateZone {
            name: "spawn".to_string(),
            parent: world,
            world: None,
            bounds: None,
        }
        .execute(&engine)
        .await
        .unwrap();
        assert!(matches!(response, AdminResponse::Zone(_)));

        AdminCommand::SetOverride {
            zone: "spawn".to_string(),
            subject: Subject::Group(GroupTier::Default),
            node: "build.place".to_string(),
            state: Override::Deny,
        }
        .execute(&engine)
        .await
        .unwrap();

        let response = AdminCommand::QueryEffective {
            actor,
            node: "build.place".to_string(),
            zone: "spawn".to_string(),
        }
        .execute(&engine)
        .await
        .unwrap();
        assert!(matches!(
            response,
            AdminResponse::Decision(PermissionDecision::Denied)
        ));
    }

    #[tokio::test]
    async fn test_invalid_node_rejected() {
        let engine = engine();
        let err = AdminCommand::QueryEffective {
            actor: Uuid::now_v7(),
            node: "not a node!".to_string(),
            zone: "__global__".to_string(),
        }
        .execute(&engine)
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidNode(_)));
    }

    #[tokio::test]
    async fn test_command_serde_round_trip() {
        let command = AdminCommand::SetOverride {
            zone: "spawn".to_string(),
            subject: Subject::Group(GroupTier::Guest),
            node: "build._ALL_".to_string(),
            state: Override::Deny,
        };
        let json = serde_json::to_string(&command).unwrap();
        assert!(json.contains("\"command\":\"set_override\""));
        let back: AdminCommand = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, AdminCommand::SetOverride { .. }));
    }
}
