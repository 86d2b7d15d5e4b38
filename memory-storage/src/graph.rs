//! Knowledge-graph store: entities, observations, and relations with
//! strength-decaying upsert, neighbour traversal and shortest-path BFS
//! (SPEC_FULL §4.1, grounded in the teacher's `memory-storage-redb/src/relationships.rs`).

use std::collections::{HashMap, HashSet, VecDeque};

use redb::ReadableTable;
use uuid::Uuid;

use memory_core::graph::decay_moving_average;
use memory_core::types::{Entity, Observation, Relation};
use memory_core::{Error, Result};

use crate::codec::{blocking, decode, encode};
use crate::tables::{entity_name_key, ENTITIES_TABLE, ENTITY_NAME_INDEX, OBSERVATIONS_TABLE, RELATIONS_TABLE};
use crate::RedbStorage;

/// How much weight a relation's previous strength carries into a re-observed
/// upsert (SPEC_FULL §4.1 `upsert_relation`); the remainder comes from the
/// freshly observed strength.
const RELATION_DECAY_ALPHA: f64 = 0.7;

impl RedbStorage {
    pub(crate) async fn upsert_entity_impl(&self, entity: Entity) -> Result<Uuid> {
        let db = self.db.clone();
        let id = entity.id;
        blocking(move || {
            let txn = db.begin_write().map_err(|e| Error::Storage(e.to_string()))?;
            {
                let key = entity_name_key(&entity.project_id, &entity.name, &entity.entity_type);
                let mut name_index = txn.open_table(ENTITY_NAME_INDEX).map_err(crate::storage_err)?;
                name_index
                    .insert(key.as_str(), id.to_string().as_str())
                    .map_err(|e| Error::Storage(e.to_string()))?;
                drop(name_index);

                let mut table = txn.open_table(ENTITIES_TABLE).map_err(crate::storage_err)?;
                let bytes = encode(&entity)?;
                table
                    .insert(id.to_string().as_str(), bytes.as_slice())
                    .map_err(|e| Error::Storage(e.to_string()))?;
            }
            txn.commit().map_err(|e| Error::Storage(e.to_string()))?;
            Ok(id)
        })
        .await
    }

    pub(crate) async fn get_entity_impl(&self, id: Uuid) -> Result<Option<Entity>> {
        let db = self.db.clone();
        blocking(move || {
            let txn = db.begin_read().map_err(|e| Error::Storage(e.to_string()))?;
            let table = txn.open_table(ENTITIES_TABLE).map_err(crate::storage_err)?;
            match table.get(id.to_string().as_str()).map_err(|e| Error::Storage(e.to_string()))? {
                Some(bytes) => Ok(Some(decode(bytes.value())?)),
                None => Ok(None),
            }
        })
        .await
    }

    pub(crate) async fn find_entity_impl(&self, project_id: &str, name: &str, entity_type: &str) -> Result<Option<Entity>> {
        let key = entity_name_key(project_id, name, entity_type);
        let db = self.db.clone();
        blocking(move || {
            let txn = db.begin_read().map_err(|e| Error::Storage(e.to_string()))?;
            let name_index = txn.open_table(ENTITY_NAME_INDEX).map_err(crate::storage_err)?;
            let Some(id_bytes) = name_index.get(key.as_str()).map_err(|e| Error::Storage(e.to_string()))? else {
                return Ok(None);
            };
            let id = id_bytes.value().to_string();
            let table = txn.open_table(ENTITIES_TABLE).map_err(crate::storage_err)?;
            match table.get(id.as_str()).map_err(|e| Error::Storage(e.to_string()))? {
                Some(bytes) => Ok(Some(decode(bytes.value())?)),
                None => Ok(None),
            }
        })
        .await
    }

    pub(crate) async fn upsert_relation_impl(&self, mut relation: Relation) -> Result<Uuid> {
        let db = self.db.clone();
        blocking(move || {
            let txn = db.begin_write().map_err(|e| Error::Storage(e.to_string()))?;
            {
                let mut table = txn.open_table(RELATIONS_TABLE).map_err(crate::storage_err)?;
                let mut existing = None;
                for row in table.iter().map_err(|e| Error::Storage(e.to_string()))? {
                    let (_, bytes) = row.map_err(|e| Error::Storage(e.to_string()))?;
                    let candidate: Relation = decode(bytes.value())?;
                    if candidate.project_id == relation.project_id
                        && candidate.from_entity == relation.from_entity
                        && candidate.to_entity == relation.to_entity
                        && candidate.relation_type == relation.relation_type
                    {
                        existing = Some(candidate);
                        break;
                    }
                }
                if let Some(mut existing) = existing {
                    existing.strength = decay_moving_average(existing.strength, relation.strength, RELATION_DECAY_ALPHA);
                    existing.confidence = relation.confidence.max(existing.confidence);
                    existing.valid_to = None;
                    let bytes = encode(&existing)?;
                    table
                        .insert(existing.id.to_string().as_str(), bytes.as_slice())
                        .map_err(|e| Error::Storage(e.to_string()))?;
                    relation.id = existing.id;
                } else {
                    let bytes = encode(&relation)?;
                    table
                        .insert(relation.id.to_string().as_str(), bytes.as_slice())
                        .map_err(|e| Error::Storage(e.to_string()))?;
                }
            }
            txn.commit().map_err(|e| Error::Storage(e.to_string()))?;
            Ok(relation.id)
        })
        .await
    }

    pub(crate) async fn add_observation_impl(&self, observation: Observation) -> Result<Uuid> {
        let db = self.db.clone();
        let id = observation.id;
        blocking(move || {
            let txn = db.begin_write().map_err(|e| Error::Storage(e.to_string()))?;
            {
                let mut table = txn.open_table(OBSERVATIONS_TABLE).map_err(crate::storage_err)?;
                let bytes = encode(&observation)?;
                table
                    .insert(id.to_string().as_str(), bytes.as_slice())
                    .map_err(|e| Error::Storage(e.to_string()))?;
            }
            txn.commit().map_err(|e| Error::Storage(e.to_string()))?;
            Ok(id)
        })
        .await
    }

    pub(crate) async fn neighbours_impl(&self, entity_id: Uuid, depth: usize, edge_filter: Option<&str>) -> Result<Vec<Entity>> {
        let edge_filter = edge_filter.map(str::to_string);
        let db = self.db.clone();
        blocking(move || {
            let relations = read_all_relations(&db, None)?;
            let adjacency = build_adjacency(&relations, edge_filter.as_deref());

            let mut visited = HashSet::from([entity_id]);
            let mut frontier = VecDeque::from([(entity_id, 0usize)]);
            let mut found = Vec::new();
            while let Some((current, dist)) = frontier.pop_front() {
                if dist >= depth {
                    continue;
                }
                for &next in adjacency.get(&current).into_iter().flatten() {
                    if visited.insert(next) {
                        found.push(next);
                        frontier.push_back((next, dist + 1));
                    }
                }
            }

            let txn = db.begin_read().map_err(|e| Error::Storage(e.to_string()))?;
            let table = txn.open_table(ENTITIES_TABLE).map_err(crate::storage_err)?;
            let mut entities = Vec::new();
            for id in found {
                if let Some(bytes) = table.get(id.to_string().as_str()).map_err(|e| Error::Storage(e.to_string()))? {
                    entities.push(decode(bytes.value())?);
                }
            }
            Ok(entities)
        })
        .await
    }

    pub(crate) async fn shortest_path_impl(&self, from: Uuid, to: Uuid, max_hops: usize) -> Result<Option<Vec<Uuid>>> {
        let db = self.db.clone();
        blocking(move || {
            if from == to {
                return Ok(Some(vec![from]));
            }
            let relations = read_all_relations(&db, None)?;
            let adjacency = build_adjacency(&relations, None);

            let mut visited = HashSet::from([from]);
            let mut frontier = VecDeque::from([from]);
            let mut parent: HashMap<Uuid, Uuid> = HashMap::new();
            let mut hops = 0usize;
            while !frontier.is_empty() && hops < max_hops {
                hops += 1;
                let mut next_frontier = VecDeque::new();
                while let Some(current) = frontier.pop_front() {
                    for &next in adjacency.get(&current).into_iter().flatten() {
                        if visited.insert(next) {
                            parent.insert(next, current);
                            if next == to {
                                let mut path = vec![to];
                                let mut cursor = to;
                                while let Some(&p) = parent.get(&cursor) {
                                    path.push(p);
                                    cursor = p;
                                    if cursor == from {
                                        break;
                                    }
                                }
                                path.reverse();
                                return Ok(Some(path));
                            }
                            next_frontier.push_back(next);
                        }
                    }
                }
                frontier = next_frontier;
            }
            Ok(None)
        })
        .await
    }

    pub(crate) async fn all_relations_impl(&self, project_id: &str) -> Result<Vec<Relation>> {
        let project_id = project_id.to_string();
        let db = self.db.clone();
        blocking(move || read_all_relations(&db, Some(&project_id))).await
    }
}

fn read_all_relations(db: &redb::Database, project_id: Option<&str>) -> Result<Vec<Relation>> {
    let txn = db.begin_read().map_err(|e| Error::Storage(e.to_string()))?;
    let table = txn.open_table(RELATIONS_TABLE).map_err(crate::storage_err)?;
    let mut relations = Vec::new();
    for row in table.iter().map_err(|e| Error::Storage(e.to_string()))? {
        let (_, bytes) = row.map_err(|e| Error::Storage(e.to_string()))?;
        let relation: Relation = decode(bytes.value())?;
        if project_id.is_none_or(|p| p == relation.project_id) {
            relations.push(relation);
        }
    }
    Ok(relations)
}

fn build_adjacency(relations: &[Relation], edge_filter: Option<&str>) -> HashMap<Uuid, Vec<Uuid>> {
    let mut adjacency: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for relation in relations {
        if let Some(filter) = edge_filter {
            if relation.relation_type != filter {
                continue;
            }
        }
        adjacency.entry(relation.from_entity).or_default().push(relation.to_entity);
        adjacency.entry(relation.to_entity).or_default().push(relation.from_entity);
    }
    adjacency
}
