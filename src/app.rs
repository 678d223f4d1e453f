//! The scene state machine of the payment QR app, without any UI toolkit.
//!
//! Scenes sit on a navigation stack. Every input arrives as an [`Event`]; the
//! current screen contents are rebuilt on demand with [`App::screen`].

use tracing::{debug, warn};

use crate::config::Config;
use crate::payload::{truncate_to, PaymentRequest, UpiId};
use crate::raster::{DisplayProfile, Layout};
use crate::store::{EntryStore, StoreError, MAX_NAME_LEN};
use crate::QrCode;

pub const MENU_ITEMS: [&str; 3] = ["New UPI ID", "Saved UPI IDs", "About"];
pub const QR_FAILED_TEXT: &str = "QR Gen Failed";

/// Text input buffers hold this many bytes at most.
const INPUT_LEN: usize = 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scene {
    Menu,
    UsernameInput,
    BankInput,
    NameInput,
    QrDisplay,
    QrFullscreen,
    SavedList,
    ConfirmDelete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Save,
    Fullscreen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A list item was chosen.
    Select(usize),
    /// A text input was confirmed.
    Text(String),
    Button(Button),
    Back,
}

/// A short message shown over the current scene until it times out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Popup {
    pub header: &'static str,
    pub text: Option<&'static str>,
    pub timeout_ms: u64,
}

impl Popup {
    pub const ABOUT: Popup = Popup {
        header: "UPI QR v1.0",
        text: Some("Generate UPI\nPayment QR Codes"),
        timeout_ms: 2000,
    };
    pub const SAVED: Popup = Popup {
        header: "Saved!",
        text: None,
        timeout_ms: 1000,
    };
    pub const DELETED: Popup = Popup {
        header: "Deleted!",
        text: None,
        timeout_ms: 1000,
    };
}

/// What a QR scene shows: the symbol placed on the screen, or the fallback
/// text when encoding failed.
#[derive(Debug, Clone)]
pub enum QrView {
    Ready { code: QrCode, layout: Layout },
    Failed(&'static str),
}

#[derive(Debug, Clone)]
pub enum Screen {
    Menu {
        header: &'static str,
        items: Vec<String>,
    },
    TextInput {
        header: &'static str,
    },
    Qr {
        view: QrView,
        buttons: &'static [&'static str],
    },
}

pub struct App {
    config: Config,
    store: EntryStore,
    stack: Vec<Scene>,
    username: String,
    bank: String,
    name: String,
    upi_id: String,
    popup: Option<Popup>,
}

impl App {
    pub fn new(config: Config, store: EntryStore) -> Self {
        let mut app = Self {
            config,
            store,
            stack: Vec::new(),
            username: String::new(),
            bank: String::new(),
            name: String::new(),
            upi_id: String::new(),
            popup: None,
        };
        app.push(Scene::Menu);
        app
    }

    /// The scene on top of the stack, or `None` once the app has exited.
    pub fn scene(&self) -> Option<Scene> {
        self.stack.last().copied()
    }

    pub fn is_running(&self) -> bool {
        !self.stack.is_empty()
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    pub fn upi_id(&self) -> &str {
        &self.upi_id
    }

    /// Removes and returns the pending popup.
    pub fn take_popup(&mut self) -> Option<Popup> {
        self.popup.take()
    }

    /// Runs the entry actions of `scene`. Only the menu has any: it clears
    /// the input buffers.
    fn enter(&mut self, scene: Scene) {
        if scene == Scene::Menu {
            self.username.clear();
            self.bank.clear();
            self.name.clear();
            self.upi_id.clear();
        }
        debug!(?scene, "entering scene");
    }

    fn push(&mut self, scene: Scene) {
        self.stack.push(scene);
        self.enter(scene);
    }

    fn pop(&mut self) {
        self.stack.pop();
        if let Some(scene) = self.scene() {
            self.enter(scene);
        }
    }

    /// Pops scenes until `scene` is on top.
    fn back_to(&mut self, scene: Scene) {
        while self.scene().is_some_and(|top| top != scene) {
            self.stack.pop();
        }
        match self.scene() {
            Some(top) => self.enter(top),
            None => self.push(scene),
        }
    }

    /// Feeds one event to the current scene. Returns whether it was consumed.
    ///
    /// # Errors
    ///
    /// Returns `Err(StoreError::Io)` when the saved entries cannot be read or
    /// written. A full store is not an error here; saving is then skipped.
    pub fn handle(&mut self, event: Event) -> Result<bool, StoreError> {
        let Some(scene) = self.scene() else {
            return Ok(false);
        };
        match (scene, event) {
            (Scene::Menu, Event::Select(0)) => self.push(Scene::UsernameInput),
            (Scene::Menu, Event::Select(1)) => {
                self.store.reload()?;
                self.push(Scene::SavedList);
            }
            (Scene::Menu, Event::Select(2)) => self.popup = Some(Popup::ABOUT),

            (Scene::UsernameInput, Event::Text(text)) => {
                self.username = truncate_to(&text, INPUT_LEN).to_owned();
                self.push(Scene::BankInput);
            }
            (Scene::BankInput, Event::Text(text)) => {
                self.bank = truncate_to(&text, INPUT_LEN).to_owned();
                self.upi_id = UpiId::from_parts(&self.username, &self.bank).to_string();
                self.push(Scene::NameInput);
            }
            (Scene::NameInput, Event::Text(text)) => {
                self.name = truncate_to(&text, MAX_NAME_LEN).to_owned();
                self.push(Scene::QrDisplay);
            }

            (Scene::QrDisplay, Event::Button(Button::Save)) => {
                match self.store.add(&self.name, &self.upi_id) {
                    Ok(_) => self.popup = Some(Popup::SAVED),
                    Err(StoreError::Full(max)) => warn!(max, "saved entries full, not saving"),
                    Err(e) => return Err(e),
                }
            }
            (Scene::QrDisplay, Event::Button(Button::Fullscreen)) => {
                self.push(Scene::QrFullscreen)
            }
            (Scene::QrDisplay, Event::Back) => self.back_to(Scene::Menu),

            (Scene::SavedList, Event::Select(index)) => {
                let Some(entry) = self.store.get(index) else {
                    return Ok(false);
                };
                self.upi_id = entry.upi_id.clone();
                self.name = entry.name.clone();
                self.push(Scene::QrDisplay);
            }
            (Scene::SavedList, Event::Back) if !self.store.is_empty() => {
                self.push(Scene::ConfirmDelete)
            }

            (Scene::ConfirmDelete, Event::Select(index)) => {
                if index < self.store.len() {
                    self.store.remove(index)?;
                    self.popup = Some(Popup::DELETED);
                    self.back_to(Scene::SavedList);
                }
            }

            (_, Event::Back) => self.pop(),
            (scene, event) => {
                debug!(?scene, ?event, "event ignored");
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// The payment request behind the QR scenes.
    pub fn payment_request(&self) -> PaymentRequest {
        PaymentRequest::new(self.upi_id.as_str(), Some(self.name.as_str()))
    }

    fn qr_view(&self, profile: DisplayProfile) -> QrView {
        let encoded = self.config.qr_version().and_then(|version| {
            QrCode::for_payment(&self.payment_request(), version, self.config.ec_level)
        });
        match encoded {
            Ok(code) => {
                let layout = profile.layout(code.size(), &self.config.display);
                QrView::Ready { code, layout }
            }
            Err(e) => {
                warn!(error = %e, upi_id = %self.upi_id, "QR generation failed");
                QrView::Failed(QR_FAILED_TEXT)
            }
        }
    }

    /// Builds what the current scene displays.
    pub fn screen(&self) -> Option<Screen> {
        let screen = match self.scene()? {
            Scene::Menu => Screen::Menu {
                header: "UPI QR Generator",
                items: MENU_ITEMS.iter().map(|s| s.to_string()).collect(),
            },
            Scene::UsernameInput => Screen::TextInput { header: "Enter Username:" },
            Scene::BankInput => Screen::TextInput { header: "Enter Bank (e.g., ybl, paytm):" },
            Scene::NameInput => Screen::TextInput { header: "Enter Name (optional):" },
            Scene::QrDisplay => Screen::Qr {
                view: self.qr_view(DisplayProfile::Preview),
                buttons: &["Save", "Full"],
            },
            Scene::QrFullscreen => Screen::Qr {
                view: self.qr_view(DisplayProfile::Fullscreen),
                buttons: &[],
            },
            Scene::SavedList => {
                let entries = self.store.entries();
                let mut items: Vec<String> = entries
                    .iter()
                    .map(|e| format!("{} - {}", e.name, e.upi_id))
                    .collect();
                items.push(if entries.is_empty() {
                    "No saved entries".to_string()
                } else {
                    "[Hold Back to Delete]".to_string()
                });
                Screen::Menu { header: "Saved UPI IDs", items }
            }
            Scene::ConfirmDelete => Screen::Menu {
                header: "Delete Entry?",
                items: self
                    .store
                    .entries()
                    .iter()
                    .map(|e| format!("Delete: {}", e.name))
                    .collect(),
            },
        };
        Some(screen)
    }
}
