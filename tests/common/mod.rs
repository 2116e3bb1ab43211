//! Common test utilities - Bh2eTest harness for end-to-end testing

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use bh2e::dice::ScriptedDice;
use bh2e::model::{Actor, ActorKind, Attribute, Item, UsageDie, Weapon, WeaponKind, WeaponSize};
use bh2e::{Config, Server};
use reqwest::Client;
use tokio::task::JoinHandle;

/// Test harness that spawns a real bh2ed server on a random port
///
/// Dice are scripted: queue faces with `dice.push(...)` before each roll.
pub struct Bh2eTest {
    pub addr: SocketAddr,
    pub client: Client,
    pub dice: Arc<ScriptedDice>,
    server: Arc<Server>,
    _handle: JoinHandle<()>,
}

impl Bh2eTest {
    /// Start a new test server instance
    pub async fn start() -> Result<Self> {
        // Find a random available port
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        drop(listener);

        let config = Config {
            bind_addr: addr,
            ..Default::default()
        };

        let dice = Arc::new(ScriptedDice::default());
        let server = Arc::new(Server::with_dice(config, dice.clone()));
        let server_clone = server.clone();

        // Spawn the server in a background task
        let handle = tokio::spawn(async move {
            if let Err(e) = server_clone.run().await {
                eprintln!("Server error: {}", e);
            }
        });

        let client = Client::builder().timeout(Duration::from_secs(5)).build()?;

        // Poll until server is ready (max 2 seconds)
        let mut ready = false;
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if client
                .get(format!("http://{}/health", addr))
                .send()
                .await
                .is_ok()
            {
                ready = true;
                break;
            }
        }

        if !ready {
            panic!("Server failed to start within 2 seconds");
        }

        Ok(Self {
            addr,
            client,
            dice,
            server,
            _handle: handle,
        })
    }

    /// Get the base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(format!("{}{}", self.base_url(), path))
            .send()
            .await?)
    }

    /// Make a POST request with JSON body
    pub async fn post<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(format!("{}{}", self.base_url(), path))
            .json(body)
            .send()
            .await?)
    }

    /// Make a PUT request with JSON body
    pub async fn put<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response> {
        Ok(self
            .client
            .put(format!("{}{}", self.base_url(), path))
            .json(body)
            .send()
            .await?)
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .delete(format!("{}{}", self.base_url(), path))
            .send()
            .await?)
    }

    /// Drain queued chat cards and notices as JSON
    pub async fn messages(&self) -> Result<Vec<serde_json::Value>> {
        Ok(self.get("/messages").await?.json().await?)
    }

    /// Shutdown the server gracefully
    pub fn shutdown(&self) {
        self.server.shutdown();
    }
}

impl Drop for Bh2eTest {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A level 2 warrior with a sword, a dagger, torches and chainmail
pub fn warrior(id: &str, name: &str) -> Actor {
    let mut actor = Actor::new(id, name, ActorKind::Character).with_class("Warrior");
    actor.level = 2;
    actor.attributes.strength = 12;
    actor
        .with_item(Item::weapon(
            &format!("{}-sword", id),
            "Longsword",
            Weapon {
                attribute: Attribute::Strength,
                kind: WeaponKind::Melee,
                size: WeaponSize::Medium,
            },
        ))
        .with_item(Item::weapon(
            &format!("{}-dagger", id),
            "Dagger",
            Weapon {
                attribute: Attribute::Dexterity,
                kind: WeaponKind::Melee,
                size: WeaponSize::Small,
            },
        ))
        .with_item(Item::equipment(
            &format!("{}-torches", id),
            "Torches",
            2,
            UsageDie::fresh(bh2e::dice::UsageDieLevel::D6),
        ))
        .with_item(Item::armour(&format!("{}-chain", id), "Chainmail", 2))
}
