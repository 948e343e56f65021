//! Game registry (§3, §4.G).
//!
//! Owns the ordered list of maps, the sessions keyed by map id, and the
//! per-session `Token -> Player` tables. Cross-references between players,
//! dogs, and sessions are represented as indices into per-game arenas rather
//! than a pointer graph (§9) -- a `Player` stores its map id and dog id; the
//! single ownership root (this `Game`) is the only place that resolves them.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dog::Dog;
use crate::errors::{GameError, GameResult};
use crate::loot::LootObject;
use crate::map::Map;
use crate::session::Session;
use crate::token::TokenIssuer;

/// A monotonic, process-wide (really: per-`Game`) id allocator. Kept separate
/// from any single entity type so that restoring a snapshot can bump the
/// counter without touching unrelated state (§9).
#[derive(Debug, Clone, Copy, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Ensures future allocations never collide with an id already seen
    /// (e.g. during snapshot restore).
    pub fn restore_at_least(&mut self, seen_id: u64) {
        if seen_id >= self.next {
            self.next = seen_id + 1;
        }
    }

    pub fn peek_next(&self) -> u64 {
        self.next
    }
}

/// Per-player record. Weakly references its dog and session by id (§3) --
/// resolving either requires going back through the owning `Game`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: u64,
    pub name: String,
    pub map_id: String,
    pub dog_id: u64,
}

/// Controls whether `Game::join` places a new dog at a random point on the
/// map's road network or at the fixed start of road 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnPolicy {
    Start,
    Random,
}

/// Global defaults applied when a map doesn't override them (§6).
#[derive(Debug, Clone, Copy)]
pub struct LootGeneratorDefaults {
    pub period_ms: f64,
    pub probability: f64,
}

impl Default for LootGeneratorDefaults {
    fn default() -> Self {
        Self { period_ms: 0.0, probability: 0.0 }
    }
}

/// The authoritative root of the simulation: maps, sessions, players, tokens.
pub struct Game {
    maps: Vec<Arc<Map>>,
    map_index: HashMap<String, usize>,
    sessions: HashMap<String, Session>,
    // Per-session (keyed by map id, matching `sessions`) token -> player id.
    tokens: HashMap<String, HashMap<String, u64>>,
    players: HashMap<u64, Player>,
    token_issuer: TokenIssuer,
    pub dog_ids: IdAllocator,
    pub player_ids: IdAllocator,
    pub loot_ids: IdAllocator,
    pub spawn_policy: SpawnPolicy,
    pub loot_defaults: LootGeneratorDefaults,
    /// Consulted by the HTTP layer, not by `tick` itself: when true, the
    /// manual `/api/v1/game/tick` route must refuse with `TickForbidden`.
    pub auto_tick_enabled: bool,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    pub fn new() -> Self {
        Self {
            maps: Vec::new(),
            map_index: HashMap::new(),
            sessions: HashMap::new(),
            tokens: HashMap::new(),
            players: HashMap::new(),
            token_issuer: TokenIssuer::new(),
            dog_ids: IdAllocator::new(),
            player_ids: IdAllocator::new(),
            loot_ids: IdAllocator::new(),
            spawn_policy: SpawnPolicy::Start,
            loot_defaults: LootGeneratorDefaults::default(),
            auto_tick_enabled: false,
        }
    }

    pub fn add_map(&mut self, map: Map) -> GameResult<()> {
        if self.map_index.contains_key(&map.id) {
            return Err(GameError::DuplicateMap(map.id));
        }
        self.map_index.insert(map.id.clone(), self.maps.len());
        self.maps.push(Arc::new(map));
        Ok(())
    }

    /// Ordered list of maps, insertion order (§8 scenario 1).
    pub fn maps(&self) -> &[Arc<Map>] {
        &self.maps
    }

    /// Returns a shared, immutable reference rather than a copy -- maps are
    /// immutable after load, so there is nothing to protect by copying (§9
    /// open question: the source's `FindMap` returns a copy; harmless there,
    /// but unnecessary here).
    pub fn find_map(&self, id: &str) -> Option<Arc<Map>> {
        self.map_index.get(id).map(|&idx| Arc::clone(&self.maps[idx]))
    }

    /// Returns the existing session for `map_id`, creating an empty one if
    /// this is the map's first join.
    pub fn session_for(&mut self, map_id: &str) -> GameResult<&mut Session> {
        if !self.sessions.contains_key(map_id) {
            let map = self.find_map(map_id).ok_or_else(|| GameError::MapNotFound(map_id.to_string()))?;
            let session = Session::new(map, self.loot_defaults.period_ms, self.loot_defaults.probability);
            self.sessions.insert(map_id.to_string(), session);
            self.tokens.insert(map_id.to_string(), HashMap::new());
        }
        Ok(self.sessions.get_mut(map_id).expect("just inserted"))
    }

    pub fn session(&self, map_id: &str) -> Option<&Session> {
        self.sessions.get(map_id)
    }

    pub fn sessions(&self) -> impl Iterator<Item = (&String, &Session)> {
        self.sessions.iter()
    }

    pub fn sessions_mut(&mut self) -> impl Iterator<Item = (&String, &mut Session)> {
        self.sessions.iter_mut()
    }

    /// Creates a player with a fresh dog, applies the map's spawn policy, and
    /// issues a token. Fails with `MapNotFound` if the map doesn't exist.
    pub fn join(&mut self, map_id: &str, player_name: String) -> GameResult<(Player, String)> {
        let map = self.find_map(map_id).ok_or_else(|| GameError::MapNotFound(map_id.to_string()))?;
        let spawn = match self.spawn_policy {
            SpawnPolicy::Random => map.random_spawn(),
            SpawnPolicy::Start => map.start_spawn(),
        }?;

        // Dog and player ids are distinct counters that happen to march in
        // lockstep for freshly-created players, since every join allocates
        // exactly one of each (§3).
        let id = self.dog_ids.next_id();
        let player_id = self.player_ids.next_id();

        let dog = Dog::new(id, spawn, map.bag_capacity, map.dog_speed);

        let session = self.session_for(map_id)?;
        session.add_dog(dog);

        let token = self.token_issuer.issue();
        let player = Player { id: player_id, name: player_name, map_id: map_id.to_string(), dog_id: id };

        self.players.insert(player_id, player.clone());
        self.tokens
            .get_mut(map_id)
            .expect("session_for just ensured this entry exists")
            .insert(token.clone(), player_id);

        Ok((player, token))
    }

    /// Linear search across per-session token maps (§4.G).
    pub fn find_player_by_token(&self, token: &str) -> Option<&Player> {
        for table in self.tokens.values() {
            if let Some(&player_id) = table.get(token) {
                return self.players.get(&player_id);
            }
        }
        None
    }

    pub fn find_player_by_id(&self, player_id: u64) -> Option<&Player> {
        self.players.get(&player_id)
    }

    /// The token table for `map_id`'s session, or an empty table if the
    /// session doesn't exist yet.
    pub fn tokens_of(&self, map_id: &str) -> HashMap<String, u64> {
        self.tokens.get(map_id).cloned().unwrap_or_default()
    }

    /// `generateLoot(Δt)` then `updateSessions(Δt/1000)` (§4.G) -- two
    /// separate passes over all sessions, not interleaved per-session.
    pub fn tick(&mut self, delta_ms: f64) {
        let mut loot_ids = self.loot_ids;
        for (_, session) in self.sessions.iter_mut() {
            session.generate_loot(delta_ms, || loot_ids.next_id());
        }
        self.loot_ids = loot_ids;

        let delta_s = delta_ms / 1000.0;
        for (_, session) in self.sessions.iter_mut() {
            session.update_dogs_positions(delta_s);
        }
    }

    /// Used only by snapshot restore: materializes a loot object with its
    /// original id, bumping the loot id counter to at least that id.
    pub fn restore_loot(&mut self, map_id: &str, loot: LootObject) -> GameResult<()> {
        self.loot_ids.restore_at_least(loot.id);
        let session = self.session_for(map_id)?;
        session.insert_loot(loot);
        Ok(())
    }

    /// Used only by snapshot restore: re-links a restored player to its
    /// session, preserving its original token, dog id, and player id.
    pub fn restore_player(&mut self, map_id: &str, player: Player, token: String, dog: Dog) -> GameResult<()> {
        self.dog_ids.restore_at_least(dog.id);
        self.player_ids.restore_at_least(player.id);

        let session = self.session_for(map_id)?;
        session.add_dog(dog);

        self.players.insert(player.id, player.clone());
        self.tokens
            .get_mut(map_id)
            .expect("session_for just ensured this entry exists")
            .insert(token, player.id);
        Ok(())
    }
}
