//! A consumer-local picture of the game world.
//!
//! Each consumer builds its own [`WorldView`] by applying the broadcast
//! messages in order. Nothing here is shared between tasks.

use std::collections::HashMap;

use cellarena_protocol::{Camera, Cell, CellId, LeaderboardEntry, Message, Screen, Status};

/// A cell is a threat when it is this much bigger than the player, and
/// prey when the player is this much bigger than it.
pub const SIZE_MARGIN: f64 = 1.1;

/// The live cell registry plus the scalar state around it.
#[derive(Debug, Clone, Default)]
pub struct WorldView {
    cells: HashMap<CellId, Cell>,
    player: Option<CellId>,
    alive: bool,
    /// Bumped on every death and every play-field reset.
    epoch: u64,
    screen: Option<Screen>,
    camera: Option<Camera>,
    leaderboard: Vec<LeaderboardEntry>,
    team_scores: Vec<f32>,
}

impl WorldView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one message into the view.
    pub fn apply(&mut self, message: &Message) {
        match message {
            Message::Status(status) => self.apply_status(status),
            Message::PlayerIdentity(id) => {
                self.player = Some(*id);
                self.alive = true;
                tracing::debug!(player = %id, "player cell assigned");
            }
            Message::ScreenAndCamera { screen, camera } => {
                // A new play field means a new connection: nothing we knew
                // about cells (ours included) is valid any more, and a spawn
                // requested on the old connection is lost.
                self.epoch += 1;
                self.cells.clear();
                self.player = None;
                self.alive = false;
                self.screen = Some(*screen);
                self.camera = Some(*camera);
            }
            Message::CameraPosition(camera) => self.camera = Some(*camera),
            Message::Leaderboard(entries) => self.leaderboard = entries.clone(),
            Message::TeamScore(scores) => self.team_scores = scores.clone(),
            Message::Reset | Message::Auxiliary { .. } | Message::Unknown { .. } => {}
        }
    }

    /// Cells first, then disappearances, then eats, so an eaten cell
    /// never survives the frame that reports it.
    fn apply_status(&mut self, status: &Status) {
        for cell in &status.cells {
            self.cells.insert(cell.id, cell.clone());
        }
        for id in &status.disappeared {
            self.cells.remove(id);
        }
        for eat in &status.eats {
            if Some(eat.eatee) == self.player && self.alive {
                tracing::info!(player = %eat.eatee, eater = %eat.eater, "player cell eaten");
                self.alive = false;
                self.player = None;
                self.epoch += 1;
            }
            self.cells.remove(&eat.eatee);
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Changes every time the player dies or the play field is reset.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn player_id(&self) -> Option<CellId> {
        self.player
    }

    /// The player's cell, if it is alive and currently visible.
    pub fn player(&self) -> Option<&Cell> {
        self.player.and_then(|id| self.cells.get(&id))
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(&id)
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Every visible cell except the player's own and viruses, ordered by
    /// id.
    pub fn opponents(&self) -> Vec<&Cell> {
        let mut cells: Vec<&Cell> = self
            .cells
            .values()
            .filter(|c| Some(c.id) != self.player && !c.is_virus)
            .collect();
        cells.sort_by_key(|c| c.id);
        cells
    }

    /// Opponents big enough to eat the player. Empty when there is no
    /// player cell.
    pub fn predators(&self) -> Vec<&Cell> {
        let Some(player) = self.player() else {
            return Vec::new();
        };
        let own = f64::from(player.size);
        self.opponents()
            .into_iter()
            .filter(|c| f64::from(c.size) > own * SIZE_MARGIN)
            .collect()
    }

    /// Opponents small enough for the player to eat.
    pub fn edible(&self) -> Vec<&Cell> {
        let Some(player) = self.player() else {
            return Vec::new();
        };
        let own = f64::from(player.size);
        self.opponents()
            .into_iter()
            .filter(|c| f64::from(c.size) * SIZE_MARGIN < own)
            .collect()
    }

    pub fn viruses(&self) -> Vec<&Cell> {
        let mut cells: Vec<&Cell> = self.cells.values().filter(|c| c.is_virus).collect();
        cells.sort_by_key(|c| c.id);
        cells
    }

    pub fn screen(&self) -> Option<&Screen> {
        self.screen.as_ref()
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    pub fn leaderboard(&self) -> &[LeaderboardEntry] {
        &self.leaderboard
    }

    pub fn team_scores(&self) -> &[f32] {
        &self.team_scores
    }
}
