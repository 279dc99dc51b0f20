//! Écran d'accueil : acquisition initiale de la position
//!
//! Tant qu'aucune position n'est connue, l'écran affiche le chargeur et
//! attend `location:loaded`. Le compte de l'utilisateur est chargé dans tous
//! les cas.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use anyhow::Result;
use coolector_map::{EventChannel, LocationProvider, SubscriptionToken, Topic, Translator};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Indicateur de chargement
pub trait Loader {
    fn display(&self);
    fn hide(&self);
}

/// Notifications éphémères
pub trait Toast {
    fn success(&self, message: &str);
    fn info(&self, message: &str);
}

/// Compte de l'utilisateur connecté
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub user_id: String,
    pub name: String,
}

pub trait AccountService {
    fn account(&self) -> Result<Account>;
}

/// Chargeur journalisé
#[derive(Debug, Default)]
pub struct LogLoader {
    visible: Cell<bool>,
}

impl LogLoader {
    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }
}

impl Loader for LogLoader {
    fn display(&self) {
        debug!("loader displayed");
        self.visible.set(true);
    }

    fn hide(&self) {
        debug!("loader hidden");
        self.visible.set(false);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToastMessage {
    pub kind: ToastKind,
    pub message: String,
}

/// Notifications journalisées et conservées
#[derive(Debug, Default)]
pub struct LogToast {
    messages: RefCell<Vec<ToastMessage>>,
}

impl LogToast {
    pub fn messages(&self) -> Vec<ToastMessage> {
        self.messages.borrow().clone()
    }

    fn push(&self, kind: ToastKind, message: &str) {
        info!(kind = ?kind, "{}", message);
        self.messages.borrow_mut().push(ToastMessage {
            kind,
            message: message.to_string(),
        });
    }
}

impl Toast for LogToast {
    fn success(&self, message: &str) {
        self.push(ToastKind::Success, message);
    }

    fn info(&self, message: &str) {
        self.push(ToastKind::Info, message);
    }
}

/// Compte fixe (mode headless)
#[derive(Debug, Clone)]
pub struct StaticAccountService(pub Account);

impl AccountService for StaticAccountService {
    fn account(&self) -> Result<Account> {
        Ok(self.0.clone())
    }
}

/// Écran d'accueil
pub struct HomeScreen {
    location: Rc<dyn LocationProvider>,
    channel: Rc<dyn EventChannel>,
    translator: Rc<dyn Translator>,
    loader: Rc<dyn Loader>,
    toast: Rc<dyn Toast>,
    accounts: Rc<dyn AccountService>,
    subscription: Option<SubscriptionToken>,
    user: Option<Account>,
}

impl HomeScreen {
    pub fn new(
        location: Rc<dyn LocationProvider>,
        channel: Rc<dyn EventChannel>,
        translator: Rc<dyn Translator>,
        loader: Rc<dyn Loader>,
        toast: Rc<dyn Toast>,
        accounts: Rc<dyn AccountService>,
    ) -> Self {
        Self {
            location,
            channel,
            translator,
            loader,
            toast,
            accounts,
            subscription: None,
            user: None,
        }
    }

    pub fn user(&self) -> Option<&Account> {
        self.user.as_ref()
    }

    /// Vrai si l'écran attend encore la position
    pub fn is_waiting_for_location(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn attach(&mut self) {
        if self.location.current().is_some() {
            self.load_user();
            return;
        }

        let loader = Rc::clone(&self.loader);
        let toast = Rc::clone(&self.toast);
        let loaded = self.translator.tr("common.location_loaded");
        self.subscription = Some(self.channel.subscribe(
            Topic::LocationLoaded,
            Box::new(move |_| {
                loader.hide();
                toast.success(&loaded);
            }),
        ));

        self.loader.display();
        self.toast.info(&self.translator.tr("common.getting_location"));
        self.load_user();
    }

    fn load_user(&mut self) {
        match self.accounts.account() {
            Ok(account) => {
                info!(user = %account.name, "account loaded");
                self.user = Some(account);
            }
            Err(e) => warn!(error = %e, "failed to load account"),
        }
    }

    /// Libère l'abonnement s'il existe
    pub fn detach(&mut self) {
        let Some(token) = self.subscription.take() else {
            return;
        };
        if !self.channel.cancel(token) {
            warn!("location subscription already released");
        }
    }
}

impl Drop for HomeScreen {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Catalog;
    use crate::location::LocationService;
    use coolector_map::{GeoPoint, LocalChannel};

    struct Fixture {
        channel: Rc<LocalChannel>,
        location: Rc<LocationService>,
        loader: Rc<LogLoader>,
        toast: Rc<LogToast>,
        home: HomeScreen,
    }

    fn fixture() -> Fixture {
        let channel = Rc::new(LocalChannel::new());
        let location = Rc::new(LocationService::new(channel.clone()));
        let loader = Rc::new(LogLoader::default());
        let toast = Rc::new(LogToast::default());
        let home = HomeScreen::new(
            location.clone(),
            channel.clone(),
            Rc::new(Catalog::english().unwrap()),
            loader.clone(),
            toast.clone(),
            Rc::new(StaticAccountService(Account {
                user_id: "u1".to_string(),
                name: "Jane".to_string(),
            })),
        );
        Fixture {
            channel,
            location,
            loader,
            toast,
            home,
        }
    }

    #[test]
    fn test_known_location_skips_loader() {
        let mut f = fixture();
        f.location.update(GeoPoint::new(52.2, 21.0));

        f.home.attach();

        assert!(!f.loader.is_visible());
        assert!(f.toast.messages().is_empty());
        assert!(!f.home.is_waiting_for_location());
        assert_eq!(f.home.user().unwrap().name, "Jane");
    }

    #[test]
    fn test_waits_for_location() {
        let mut f = fixture();
        f.home.attach();

        assert!(f.loader.is_visible());
        assert_eq!(
            f.toast.messages(),
            vec![ToastMessage {
                kind: ToastKind::Info,
                message: "Getting the current location...".to_string(),
            }]
        );
        assert!(f.home.user().is_some());

        f.location.update(GeoPoint::new(52.2, 21.0));

        assert!(!f.loader.is_visible());
        assert_eq!(f.toast.messages()[1].kind, ToastKind::Success);
        assert_eq!(f.toast.messages()[1].message, "Location has been loaded.");
    }

    #[test]
    fn test_detach_releases_subscription_once() {
        let mut f = fixture();
        f.home.detach();
        f.home.attach();
        assert_eq!(f.channel.subscriber_count(Topic::LocationLoaded), 1);

        f.home.detach();
        f.home.detach();
        assert_eq!(f.channel.subscriber_count(Topic::LocationLoaded), 0);
    }
}
