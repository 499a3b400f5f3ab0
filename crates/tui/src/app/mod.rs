use std::{
    fs::File,
    time::{Duration, Instant},
};

use crossterm::event::{self, Event, KeyEvent};
use engine::{
    AttachmentTarget, BlobKind, EngineError, ExpenseId, Gateway, Inventory, SettingsStore,
    Vehicle, VehicleId, export,
};

use crate::{
    error::{AppError, Result},
    ui::{
        self,
        keymap::{AppAction, map_key},
    },
};

pub use form::{FormKind, FormState};

mod form;

const TOAST_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Inventory,
    Detail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Password,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMode {
    SignIn,
    SignUp,
}

impl LoginMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::SignIn => "sign in",
            Self::SignUp => "sign up",
        }
    }
}

#[derive(Debug)]
pub struct LoginState {
    pub email: String,
    pub password: String,
    pub focus: LoginField,
    pub mode: LoginMode,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct ToastState {
    pub message: String,
    pub level: ToastLevel,
    pub shown_at: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    Vehicle(VehicleId),
    Expense(VehicleId, ExpenseId),
}

#[derive(Debug, Clone)]
pub enum Overlay {
    Form(FormState),
    ConfirmDelete { target: DeleteTarget, label: String },
}

#[derive(Debug)]
pub struct AppState {
    pub screen: Screen,
    pub login: LoginState,
    pub user: Option<String>,
    /// Index into the visible (filtered) list.
    pub selected: usize,
    pub searching: bool,
    pub detail: Option<VehicleId>,
    pub expense_selected: usize,
    pub overlay: Option<Overlay>,
    pub toast: Option<ToastState>,
    pub dark_mode: bool,
}

pub struct App<G> {
    inventory: Inventory<G>,
    settings: SettingsStore,
    pub state: AppState,
    should_quit: bool,
}

impl<G: Gateway> App<G> {
    pub fn new(inventory: Inventory<G>, settings: SettingsStore, email: &str) -> Self {
        let state = AppState {
            screen: Screen::Login,
            login: LoginState {
                email: email.to_string(),
                password: String::new(),
                focus: if email.is_empty() {
                    LoginField::Email
                } else {
                    LoginField::Password
                },
                mode: LoginMode::SignIn,
                message: None,
            },
            user: None,
            selected: 0,
            searching: false,
            detail: None,
            expense_selected: 0,
            overlay: None,
            toast: None,
            dark_mode: settings.dark_mode(),
        };

        Self {
            inventory,
            settings,
            state,
            should_quit: false,
        }
    }

    pub fn inventory(&self) -> &Inventory<G> {
        &self.inventory
    }

    /// Skip the login screen when a stored session is still valid.
    pub async fn start(&mut self) {
        match self.inventory.gateway().current_user().await {
            Ok(Some(user)) => {
                self.state.user = Some(user.email.unwrap_or(user.id));
                self.state.screen = Screen::Inventory;
                self.reload().await;
            }
            Ok(None) => {}
            Err(err) => self.state.login.message = Some(err.alert()),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.start().await;
        let mut terminal = ui::setup_terminal()?;
        let result = self.event_loop(&mut terminal).await;
        ui::restore_terminal(&mut terminal)?;
        result
    }

    async fn event_loop(&mut self, terminal: &mut ui::Terminal) -> Result<()> {
        let tick_rate = Duration::from_millis(200);

        while !self.should_quit {
            terminal
                .draw(|frame| ui::render(frame, &self.state, &self.inventory))
                .map_err(|err| AppError::Terminal(err.to_string()))?;

            if event::poll(tick_rate)?
                && let Event::Key(key) = event::read()?
            {
                self.handle_key(key).await;
            }
            self.expire_toast();
        }

        Ok(())
    }

    fn expire_toast(&mut self) {
        if self
            .state
            .toast
            .as_ref()
            .is_some_and(|toast| toast.shown_at.elapsed() >= TOAST_TTL)
        {
            self.state.toast = None;
        }
    }

    fn toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.state.toast = Some(ToastState {
            message: message.into(),
            level,
            shown_at: Instant::now(),
        });
    }

    /// Surface a failed operation. A lost session sends the user back to
    /// the login screen.
    fn report(&mut self, err: &EngineError) {
        if matches!(err, EngineError::NotAuthenticated) {
            self.state.screen = Screen::Login;
            self.state.overlay = None;
            self.state.login.message = Some(err.alert());
            return;
        }
        self.toast(ToastLevel::Error, err.alert());
    }

    pub async fn handle_key(&mut self, key: KeyEvent) {
        self.handle_action(map_key(key)).await;
    }

    pub async fn handle_action(&mut self, action: AppAction) {
        if action == AppAction::Quit {
            self.should_quit = true;
            return;
        }
        if let Some(overlay) = self.state.overlay.take() {
            self.handle_overlay(overlay, action).await;
            return;
        }
        match self.state.screen {
            Screen::Login => self.handle_login(action).await,
            Screen::Inventory => self.handle_inventory(action).await,
            Screen::Detail => self.handle_detail(action).await,
        }
    }

    async fn handle_login(&mut self, action: AppAction) {
        let login = &mut self.state.login;
        match action {
            AppAction::NextField | AppAction::PrevField | AppAction::Up | AppAction::Down => {
                login.focus = match login.focus {
                    LoginField::Email => LoginField::Password,
                    LoginField::Password => LoginField::Email,
                };
            }
            AppAction::SwitchMode => {
                login.mode = match login.mode {
                    LoginMode::SignIn => LoginMode::SignUp,
                    LoginMode::SignUp => LoginMode::SignIn,
                };
                login.message = None;
            }
            AppAction::Backspace => {
                self.active_login_field().pop();
            }
            AppAction::Input(ch) => self.active_login_field().push(ch),
            AppAction::Submit => self.attempt_login().await,
            AppAction::Cancel => self.should_quit = true,
            AppAction::Quit | AppAction::None => {}
        }
    }

    fn active_login_field(&mut self) -> &mut String {
        match self.state.login.focus {
            LoginField::Email => &mut self.state.login.email,
            LoginField::Password => &mut self.state.login.password,
        }
    }

    async fn attempt_login(&mut self) {
        let email = self.state.login.email.trim().to_string();
        let password = self.state.login.password.clone();
        if email.is_empty() || password.is_empty() {
            self.state.login.message = Some("Please enter email and password.".to_string());
            return;
        }

        let gateway = self.inventory.gateway();
        let result = match self.state.login.mode {
            LoginMode::SignIn => gateway.sign_in(&email, &password).await,
            LoginMode::SignUp => gateway.sign_up(&email, &password).await,
        };
        match result {
            Ok(session) => {
                tracing::info!("signed in as {}", session.user.id);
                self.state.user = Some(session.user.email.unwrap_or(session.user.id));
                self.state.login.password.clear();
                self.state.login.message = None;
                self.state.screen = Screen::Inventory;
                self.state.selected = 0;
                self.reload().await;
            }
            Err(EngineError::Auth(message)) if self.state.login.mode == LoginMode::SignUp => {
                self.state.login.message = Some(message);
            }
            Err(err) => self.state.login.message = Some(err.alert()),
        }
    }

    async fn reload(&mut self) -> bool {
        let loaded = match self.inventory.load().await {
            Ok(()) => true,
            Err(err) => {
                self.report(&err);
                false
            }
        };
        self.clamp_selection();
        loaded
    }

    fn clamp_selection(&mut self) {
        let len = self.inventory.visible().len();
        self.state.selected = self.state.selected.min(len.saturating_sub(1));
        let expenses = self
            .detail_vehicle()
            .map(|vehicle| vehicle.expenses.len())
            .unwrap_or(0);
        self.state.expense_selected = self.state.expense_selected.min(expenses.saturating_sub(1));
    }

    fn selected_vehicle(&self) -> Option<&Vehicle> {
        self.inventory.visible().get(self.state.selected).copied()
    }

    fn detail_vehicle(&self) -> Option<&Vehicle> {
        let id = self.state.detail.as_ref()?;
        self.inventory.vehicle(id).ok()
    }

    async fn handle_inventory(&mut self, action: AppAction) {
        if self.state.searching {
            let mut query = self.inventory.query().to_string();
            match action {
                AppAction::Input(ch) => query.push(ch),
                AppAction::Backspace => {
                    query.pop();
                }
                AppAction::Cancel => {
                    query.clear();
                    self.state.searching = false;
                }
                AppAction::Submit => self.state.searching = false,
                _ => {}
            }
            self.inventory.set_query(query);
            self.state.selected = 0;
            return;
        }

        match action {
            AppAction::Up | AppAction::Input('k') => {
                self.state.selected = self.state.selected.saturating_sub(1);
            }
            AppAction::Down | AppAction::Input('j') => {
                self.state.selected += 1;
                self.clamp_selection();
            }
            AppAction::Submit => {
                if let Some(id) = self.selected_vehicle().map(|v| v.id.clone()) {
                    self.state.detail = Some(id);
                    self.state.expense_selected = 0;
                    self.state.screen = Screen::Detail;
                }
            }
            AppAction::Cancel => self.inventory.set_query(""),
            AppAction::Input('/') => self.state.searching = true,
            AppAction::Input('q') => self.should_quit = true,
            AppAction::Input('r') => {
                if self.reload().await {
                    self.toast(ToastLevel::Info, "Inventory refreshed");
                }
            }
            AppAction::Input('n') => {
                self.state.overlay = Some(Overlay::Form(FormState::add_vehicle()));
            }
            AppAction::Input('s') => {
                if let Some(id) = self.selected_vehicle().map(|v| v.id.clone()) {
                    self.open_sell(id);
                }
            }
            AppAction::Input('x') => {
                if let Some((id, label)) = self.selected_vehicle().map(|v| (v.id.clone(), v.title()))
                {
                    self.state.overlay = Some(Overlay::ConfirmDelete {
                        target: DeleteTarget::Vehicle(id),
                        label,
                    });
                }
            }
            AppAction::Input('e') => self.export(),
            AppAction::Input('d') => self.toggle_dark_mode(),
            AppAction::Input('L') => self.sign_out().await,
            _ => {}
        }
    }

    async fn handle_detail(&mut self, action: AppAction) {
        let Some(vehicle) = self.detail_vehicle().cloned() else {
            self.state.screen = Screen::Inventory;
            self.state.detail = None;
            return;
        };
        let expenses = vehicle.expenses_newest_first();

        match action {
            AppAction::Cancel | AppAction::Input('b') => {
                self.state.screen = Screen::Inventory;
                self.state.detail = None;
            }
            AppAction::Up | AppAction::Input('k') => {
                self.state.expense_selected = self.state.expense_selected.saturating_sub(1);
            }
            AppAction::Down | AppAction::Input('j') => {
                self.state.expense_selected = (self.state.expense_selected + 1)
                    .min(expenses.len().saturating_sub(1));
            }
            AppAction::Input('q') => self.should_quit = true,
            AppAction::Input('s') => self.open_sell(vehicle.id.clone()),
            AppAction::Input('e') => {
                self.state.overlay = Some(Overlay::Form(FormState::edit_vehicle(&vehicle)));
            }
            AppAction::Input('a') => {
                self.state.overlay = Some(Overlay::Form(FormState::add_expense(&vehicle)));
            }
            AppAction::Input('E') => {
                if let Some(expense) = expenses.get(self.state.expense_selected) {
                    self.state.overlay = Some(Overlay::Form(FormState::edit_expense(
                        &vehicle.id,
                        expense,
                    )));
                }
            }
            AppAction::Input('x') => {
                if let Some(expense) = expenses.get(self.state.expense_selected) {
                    self.state.overlay = Some(Overlay::ConfirmDelete {
                        target: DeleteTarget::Expense(vehicle.id.clone(), expense.id.clone()),
                        label: expense.description.clone(),
                    });
                }
            }
            AppAction::Input('X') => {
                self.state.overlay = Some(Overlay::ConfirmDelete {
                    target: DeleteTarget::Vehicle(vehicle.id.clone()),
                    label: vehicle.title(),
                });
            }
            AppAction::Input('p') => {
                self.state.overlay = Some(Overlay::Form(FormState::attach(
                    &vehicle,
                    BlobKind::Image,
                )));
            }
            AppAction::Input('i') => {
                self.state.overlay = Some(Overlay::Form(FormState::attach(
                    &vehicle,
                    BlobKind::Invoice,
                )));
            }
            AppAction::Input('o') => self.open(&vehicle.id, BlobKind::Invoice),
            AppAction::Input('O') => self.open(&vehicle.id, BlobKind::Image),
            AppAction::Input('d') => self.toggle_dark_mode(),
            _ => {}
        }
    }

    fn open_sell(&mut self, id: VehicleId) {
        let Ok(vehicle) = self.inventory.vehicle(&id) else {
            return;
        };
        if vehicle.is_sold() {
            self.toast(ToastLevel::Error, EngineError::AlreadySold(id.to_string()).alert());
            return;
        }
        self.state.overlay = Some(Overlay::Form(FormState::sell(vehicle)));
    }

    fn open(&mut self, id: &VehicleId, kind: BlobKind) {
        let target = match kind {
            BlobKind::Image => self.inventory.open_image(id),
            BlobKind::Invoice => self.inventory.open_invoice(id),
        };
        match target {
            Ok(AttachmentTarget::Remote(url)) => self.toast(ToastLevel::Info, url),
            Ok(AttachmentTarget::Local(path)) => {
                self.toast(ToastLevel::Info, path.display().to_string());
            }
            Err(err) => self.report(&err),
        }
    }

    fn export(&mut self) {
        let vehicles = self.inventory.visible();
        let count = vehicles.len();
        let result = File::create(export::DEFAULT_FILE_NAME)
            .map_err(|err| EngineError::Export(err.to_string()))
            .and_then(|file| export::write_csv(file, vehicles));
        match result {
            Ok(()) => self.toast(
                ToastLevel::Success,
                format!("Exported {count} vehicles to {}", export::DEFAULT_FILE_NAME),
            ),
            Err(err) => self.report(&err),
        }
    }

    fn toggle_dark_mode(&mut self) {
        match self.settings.toggle_dark_mode() {
            Ok(dark) => {
                self.state.dark_mode = dark;
                let label = if dark { "Dark mode on" } else { "Dark mode off" };
                self.toast(ToastLevel::Info, label);
            }
            Err(err) => self.report(&err),
        }
    }

    async fn sign_out(&mut self) {
        if let Err(err) = self.inventory.gateway().sign_out().await {
            self.report(&err);
            return;
        }
        self.state.user = None;
        self.state.detail = None;
        self.state.screen = Screen::Login;
        self.state.login.message = None;
    }

    async fn handle_overlay(&mut self, overlay: Overlay, action: AppAction) {
        match overlay {
            Overlay::ConfirmDelete { target, label } => {
                if action == AppAction::Input('y') {
                    self.delete(target, &label).await;
                }
            }
            Overlay::Form(mut form) => match action {
                AppAction::Cancel => {}
                AppAction::NextField | AppAction::Down => {
                    form.next_field();
                    self.state.overlay = Some(Overlay::Form(form));
                }
                AppAction::PrevField | AppAction::Up => {
                    form.prev_field();
                    self.state.overlay = Some(Overlay::Form(form));
                }
                AppAction::Backspace => {
                    form.pop();
                    self.state.overlay = Some(Overlay::Form(form));
                }
                AppAction::Input(ch) => {
                    form.push(ch);
                    self.state.overlay = Some(Overlay::Form(form));
                }
                AppAction::Submit => self.submit(form).await,
                _ => self.state.overlay = Some(Overlay::Form(form)),
            },
        }
    }

    async fn delete(&mut self, target: DeleteTarget, label: &str) {
        let result = match &target {
            DeleteTarget::Vehicle(id) => self.inventory.delete_vehicle(id).await,
            DeleteTarget::Expense(vehicle_id, id) => {
                self.inventory.delete_expense(vehicle_id, id).await
            }
        };
        match result {
            Ok(()) => {
                if matches!(target, DeleteTarget::Vehicle(_)) {
                    self.state.detail = None;
                    self.state.screen = Screen::Inventory;
                }
                self.clamp_selection();
                self.toast(ToastLevel::Success, format!("Deleted {label}"));
            }
            Err(err) => self.report(&err),
        }
    }

    /// Run the form's operation. On failure the form stays open with the
    /// reason shown in place.
    async fn submit(&mut self, mut form: FormState) {
        let result = match &form.kind {
            FormKind::AddVehicle => match self.inventory.add_vehicle(&form.vehicle_form()).await {
                Ok(id) => {
                    self.select_vehicle(&id);
                    Ok("Vehicle added".to_string())
                }
                Err(err) => Err(err),
            },
            FormKind::EditVehicle(id) => self
                .inventory
                .update_vehicle(id, &form.vehicle_edit_form())
                .await
                .map(|()| "Vehicle updated".to_string()),
            FormKind::Sell(id) => match self.inventory.sell_vehicle(id, form.value(0)).await {
                Ok(()) => Ok(match self.inventory.vehicle(id).ok().and_then(Vehicle::profit) {
                    Some(profit) => format!("Sold, profit {profit}"),
                    None => "Sold".to_string(),
                }),
                Err(err) => Err(err),
            },
            FormKind::AddExpense(id) => self
                .inventory
                .add_expense(id, &form.expense_form())
                .await
                .map(|_| "Expense added".to_string()),
            FormKind::EditExpense(vehicle_id, id) => self
                .inventory
                .update_expense(vehicle_id, id, &form.expense_edit_form())
                .await
                .map(|()| "Expense updated".to_string()),
            FormKind::Attach(id, kind) => {
                let path = std::path::PathBuf::from(form.value(0).trim());
                let uploaded = match kind {
                    BlobKind::Image => self.inventory.attach_image(id, &path).await,
                    BlobKind::Invoice => self.inventory.attach_invoice(id, &path).await,
                };
                uploaded.map(|_| format!("Uploaded {}", kind.label()))
            }
        };

        match result {
            Ok(message) => {
                self.clamp_selection();
                self.toast(ToastLevel::Success, message);
            }
            Err(EngineError::NotAuthenticated) => self.report(&EngineError::NotAuthenticated),
            Err(EngineError::Validation(errors)) => {
                form.reject(Some(errors), None);
                self.state.overlay = Some(Overlay::Form(form));
            }
            Err(err) => {
                form.reject(None, Some(err.alert()));
                self.state.overlay = Some(Overlay::Form(form));
            }
        }
    }

    fn select_vehicle(&mut self, id: &VehicleId) {
        if let Some(index) = self
            .inventory
            .visible()
            .iter()
            .position(|vehicle| &vehicle.id == id)
        {
            self.state.selected = index;
        }
    }
}
