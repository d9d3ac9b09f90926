// Camera Wi-Fi Setup - Console Front End
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Line-oriented front end.
//!
//! Reads one command per line and renders the camera list and Wi-Fi setup
//! state as text. Changes to the setup state that happen between commands
//! (scan updates, provisioning results) are printed as they arrive.

use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::watch;
use tracing::debug;

use crate::application::Application;
use crate::models::validation::validate_mac_address;
use crate::models::{CameraRecord, Error, NetworkSnapshot, Result};
use crate::services::{
    CameraListEvent, SettingsPanel, SetupPanel, WifiPlatform, WifiSetupController, WifiSetupState,
};

/// Brand recorded for cameras added by serial.
const DEFAULT_BRAND: &str = "Ezviz";

const HELP: &str = "\
Cameras:
  cameras                     List registered cameras
  qr                          Scan a camera QR code
  add-qr <payload>            Add a camera from QR text (fields separated by \\n)
  add <serial> [code]         Add a camera by serial
  rename <n> [name]           Rename camera n
  wifi [n]                    Set up Wi-Fi for camera n (or without a camera)
  code <n> <code>             Confirm camera n's code and open Wi-Fi setup
  live <n> | recordings <n>   Watch camera n

Wi-Fi setup:
  scan                        Scan for networks
  networks                    List networks in range
  select <n|bssid>            Select a network
  password <text>             Set the network password
  connect                     Send the network to the camera
  dismiss                     Hide the connection status
  radio on|off                Switch the Wi-Fi radio
  settings wifi|location      Open system settings

  theme                       Toggle dark/light theme
  help                        Show this help
  quit                        Exit";

/// A parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Cameras,
    ScanQr,
    AddQr(String),
    Add { serial: String, code: Option<String> },
    Rename { camera: String, name: Option<String> },
    Wifi(Option<String>),
    Code { camera: String, code: String },
    Live(String),
    Recordings(String),
    Scan,
    Networks,
    Select(String),
    Password(String),
    Connect,
    Dismiss,
    Radio(bool),
    Settings(SettingsPanel),
    Theme,
    Quit,
}

fn usage(text: &str) -> Error {
    Error::ValidationFailed(format!("usage: {}", text))
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim_start();
        let (word, raw_rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = raw_rest.trim();
        let mut args = rest.split_whitespace();

        let command = match word.trim_end() {
            "" => return Ok(None),
            "help" | "?" => Self::Help,
            "cameras" | "ls" => Self::Cameras,
            "qr" => Self::ScanQr,
            "add-qr" => {
                if rest.is_empty() {
                    return Err(usage("add-qr <brand>\\n<serial>\\n<code>\\n<model>"));
                }
                Self::AddQr(rest.replace("\\n", "\n"))
            }
            "add" => match (args.next(), args.next()) {
                (Some(serial), code) => Self::Add {
                    serial: serial.to_string(),
                    code: code.map(str::to_string),
                },
                _ => return Err(usage("add <serial> [code]")),
            },
            "rename" => match rest.split_once(char::is_whitespace) {
                Some((camera, name)) => Self::Rename {
                    camera: camera.to_string(),
                    name: Some(name.to_string()),
                },
                None if !rest.is_empty() => Self::Rename {
                    camera: rest.to_string(),
                    name: None,
                },
                None => return Err(usage("rename <n> [name]")),
            },
            "wifi" => Self::Wifi(args.next().map(str::to_string)),
            "code" => match (args.next(), args.next()) {
                (Some(camera), Some(code)) => Self::Code {
                    camera: camera.to_string(),
                    code: code.to_string(),
                },
                _ => return Err(usage("code <n> <code>")),
            },
            "live" => Self::Live(args.next().ok_or_else(|| usage("live <n>"))?.to_string()),
            "recordings" => Self::Recordings(args.next().ok_or_else(|| usage("recordings <n>"))?.to_string()),
            "scan" => Self::Scan,
            "networks" => Self::Networks,
            "select" => Self::Select(args.next().ok_or_else(|| usage("select <n|bssid>"))?.to_string()),
            // Passwords are kept verbatim, including surrounding spaces.
            "password" => Self::Password(raw_rest.to_string()),
            "connect" => Self::Connect,
            "dismiss" => Self::Dismiss,
            "radio" => match args.next() {
                Some("on") => Self::Radio(true),
                Some("off") => Self::Radio(false),
                _ => return Err(usage("radio on|off")),
            },
            "settings" => match args.next() {
                Some("wifi") => Self::Settings(SettingsPanel::Wifi),
                Some("location") => Self::Settings(SettingsPanel::Location),
                _ => return Err(usage("settings wifi|location")),
            },
            "theme" => Self::Theme,
            "quit" | "exit" | "q" => Self::Quit,
            other => {
                return Err(Error::ValidationFailed(format!(
                    "unknown command '{}', type 'help' for a list",
                    other
                )))
            }
        };
        Ok(Some(command))
    }
}

/// Whether the console should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Console session over an [`Application`].
pub struct Console<P: WifiPlatform, W: Write> {
    app: Application<P>,
    out: W,
    setup: Option<WifiSetupController<P>>,
    setup_state: Option<watch::Receiver<WifiSetupState>>,
    last_panel: Option<SetupPanel>,
    last_status: Option<String>,
}

impl<P: WifiPlatform, W: Write> Console<P, W> {
    pub fn new(app: Application<P>, out: W) -> Self {
        Self {
            app,
            out,
            setup: None,
            setup_state: None,
            last_panel: None,
            last_status: None,
        }
    }

    /// Read commands until `quit` or end of input.
    pub async fn run<R: AsyncBufRead + Unpin>(mut self, input: R) -> Result<()> {
        writeln!(self.out, "Type 'help' for a list of commands.")?;
        let mut lines = input.lines();
        loop {
            let next = {
                let setup_state = &mut self.setup_state;
                tokio::select! {
                    line = lines.next_line() => Input::Line(line?),
                    alive = setup_changed(setup_state) => Input::SetupChanged(alive),
                }
            };
            match next {
                Input::Line(None) => break,
                Input::Line(Some(line)) => {
                    if self.execute(&line)? == Flow::Quit {
                        break;
                    }
                }
                Input::SetupChanged(true) => self.report_setup_state()?,
                Input::SetupChanged(false) => self.setup_state = None,
            }
        }
        debug!("Console closed");
        Ok(())
    }

    /// Run one command line. Command errors are printed, output errors are
    /// returned.
    pub fn execute(&mut self, line: &str) -> Result<Flow> {
        let flow = match Command::parse(line) {
            Ok(Some(command)) => match self.dispatch(command) {
                Ok(flow) => flow,
                Err(e) if e.is_user_input() => {
                    writeln!(self.out, "{}", user_message(&e))?;
                    Flow::Continue
                }
                Err(Error::Io(e)) => return Err(Error::Io(e)),
                Err(e) => {
                    writeln!(self.out, "Error: {}", e)?;
                    Flow::Continue
                }
            },
            Ok(None) => Flow::Continue,
            Err(e) => {
                writeln!(self.out, "{}", user_message(&e))?;
                Flow::Continue
            }
        };
        self.drain_camera_list()?;
        self.report_setup_state()?;
        Ok(flow)
    }

    fn dispatch(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Help => writeln!(self.out, "{}", HELP)?,
            Command::Cameras => self.print_cameras()?,
            Command::ScanQr => self.app.camera_list().on_scan_qr_clicked(),
            Command::AddQr(text) => self.app.camera_list().process_qr_text(&text),
            Command::Add { serial, code } => {
                let code = code.unwrap_or_else(|| self.app.config().default_camera_code);
                if self.app.registry().add(CameraRecord::new(&serial, code, DEFAULT_BRAND)) {
                    writeln!(self.out, "Camera {} added.", serial)?;
                } else {
                    writeln!(self.out, "Camera {} is already registered.", serial)?;
                }
            }
            Command::Rename { camera, name } => {
                let camera = self.camera_at(&camera)?;
                match name {
                    Some(name) => self.app.camera_list().rename_camera(&camera, &name),
                    None => self.app.camera_list().on_rename_clicked(&camera),
                }
            }
            Command::Wifi(None) => self.open_setup(None)?,
            Command::Wifi(Some(camera)) => {
                let camera = self.camera_at(&camera)?;
                self.app.camera_list().on_add_wifi_clicked(&camera);
            }
            Command::Code { camera, code } => {
                let camera = self.camera_at(&camera)?;
                self.app.camera_list().validate_code_and_navigate(&camera.serial, &code);
            }
            Command::Live(camera) => {
                let camera = self.camera_at(&camera)?;
                self.app.camera_list().on_watch_live_clicked(&camera);
            }
            Command::Recordings(camera) => {
                let camera = self.camera_at(&camera)?;
                self.app.camera_list().on_watch_recordings_clicked(&camera);
            }
            Command::Scan => match &self.setup {
                Some(setup) => setup.scan_networks(),
                None => self.app.observer().start_scan(),
            },
            Command::Networks => self.print_networks()?,
            Command::Select(target) => {
                let network = self.network_for(&target)?;
                writeln!(self.out, "Selected {}.", network.ssid)?;
                self.require_setup()?.select_network(network);
            }
            Command::Password(password) => self.require_setup()?.set_password(password),
            Command::Connect => {
                if self.require_setup()?.state().selected_network.is_none() {
                    writeln!(self.out, "Select a network first.")?;
                } else {
                    self.require_setup()?.connect();
                }
            }
            Command::Dismiss => self.require_setup()?.dismiss_status(),
            Command::Radio(enabled) => match &self.setup {
                Some(setup) => setup.set_wifi_enabled(enabled),
                None => self.app.observer().set_wifi_enabled(enabled),
            },
            Command::Settings(panel) => match (&self.setup, panel) {
                (Some(setup), SettingsPanel::Wifi) => setup.open_wifi_settings(),
                (Some(setup), SettingsPanel::Location) => setup.open_location_settings(),
                (None, SettingsPanel::Wifi) => self.app.observer().open_wifi_settings(),
                (None, SettingsPanel::Location) => self.app.observer().open_location_settings(),
            },
            Command::Theme => {
                let mode = self.app.toggle_theme()?;
                writeln!(self.out, "Theme: {}", mode.as_str())?;
            }
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn require_setup(&self) -> Result<&WifiSetupController<P>> {
        self.setup
            .as_ref()
            .ok_or_else(|| Error::ValidationFailed("No Wi-Fi setup open. Use 'wifi' first.".to_string()))
    }

    /// Resolve a 1-based camera number.
    fn camera_at(&self, index: &str) -> Result<CameraRecord> {
        index
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|n| self.app.registry().cameras().into_iter().nth(n))
            .ok_or_else(|| Error::CameraNotFound(index.to_string()))
    }

    /// Resolve a 1-based network number or a BSSID.
    fn network_for(&self, target: &str) -> Result<NetworkSnapshot> {
        let networks = self.require_setup()?.state().available_networks;
        let found = match target.parse::<usize>() {
            Ok(n) => n.checked_sub(1).and_then(|n| networks.get(n).cloned()),
            Err(_) => {
                let bssid = validate_mac_address(target)?;
                networks.into_iter().find(|n| n.bssid.eq_ignore_ascii_case(&bssid))
            }
        };
        found.ok_or_else(|| Error::ValidationFailed(format!("No network '{}' in range.", target)))
    }

    fn open_setup(&mut self, serial: Option<&str>) -> Result<()> {
        let setup = self.app.open_wifi_setup(serial)?;
        match setup.camera_serial() {
            Some(serial) => writeln!(self.out, "Wi-Fi setup for camera {}.", serial)?,
            None => writeln!(self.out, "Wi-Fi setup.")?,
        }
        self.setup_state = Some(setup.subscribe());
        self.setup = Some(setup);
        self.last_panel = None;
        self.last_status = None;
        Ok(())
    }

    fn drain_camera_list(&mut self) -> Result<()> {
        if let Some(notice) = self.app.camera_list().consume_notice() {
            writeln!(self.out, "{}", notice)?;
        }
        let Some(event) = self.app.camera_list().consume_event() else {
            return Ok(());
        };
        match event {
            CameraListEvent::NavigateToWifiScan(serial) => {
                if let Err(e) = self.open_setup(Some(&serial)) {
                    writeln!(self.out, "Error: {}", e)?;
                }
            }
            CameraListEvent::ShowRenameDialog(camera) => {
                writeln!(self.out, "Rename '{}' with: rename <n> <new name>", camera.name)?
            }
            CameraListEvent::StartQrCodeScan => writeln!(
                self.out,
                "Paste the QR text with: add-qr <brand>\\n<serial>\\n<code>\\n<model>"
            )?,
            CameraListEvent::PromptForCameraCodeBeforeWifi(serial) => {
                writeln!(self.out, "Enter the code of camera {} with: code <n> <code>", serial)?
            }
        }
        Ok(())
    }

    /// Print panel and status changes since the last report.
    fn report_setup_state(&mut self) -> Result<()> {
        let Some(state) = self.setup.as_ref().map(|s| s.state()) else {
            return Ok(());
        };
        if let Some(rx) = self.setup_state.as_mut() {
            rx.mark_unchanged();
        }

        let panel = state.panel();
        if self.last_panel != Some(panel) {
            self.last_panel = Some(panel);
            match panel {
                SetupPanel::WifiOff => writeln!(
                    self.out,
                    "Wi-Fi is off. Turn it on with 'radio on' or open 'settings wifi'."
                )?,
                SetupPanel::LocationOff => writeln!(
                    self.out,
                    "Location services are off. Enable them with 'settings location'."
                )?,
                SetupPanel::Networks => writeln!(self.out, "Wi-Fi is on. Type 'networks' to list networks.")?,
            }
        }

        let status = if state.show_connection_status {
            state.connection_status_message
        } else {
            None
        };
        if status != self.last_status {
            if let Some(message) = &status {
                writeln!(self.out, "{}", message)?;
            }
            self.last_status = status;
        }
        Ok(())
    }

    fn print_cameras(&mut self) -> Result<()> {
        let registry = self.app.registry();
        if registry.is_empty() {
            writeln!(self.out, "No cameras yet. Use 'qr' or 'add' to register one.")?;
            return Ok(());
        }
        writeln!(self.out, "{} camera(s):", registry.len())?;
        for (i, camera) in registry.cameras().iter().enumerate() {
            writeln!(
                self.out,
                "{:>3}. {} (serial {}, {})",
                i + 1,
                camera.name,
                camera.serial,
                camera.brand
            )?;
        }
        Ok(())
    }

    /// List networks from the open setup, or straight from the observer
    /// after a fresh scan when no setup is open.
    fn print_networks(&mut self) -> Result<()> {
        let Some(state) = self.setup.as_ref().map(|s| s.state()) else {
            let observer = self.app.observer();
            observer.scan_networks();
            let networks = observer.current_snapshots();
            let connected = observer.currently_connected();
            return self.write_networks(&networks, connected.as_ref(), None);
        };
        self.write_networks(
            &state.available_networks,
            state.current_connected_network.as_ref(),
            state.selected_network.as_ref(),
        )?;
        if let Some(selected) = &state.selected_network {
            if selected.security.requires_password() && state.password.is_empty() {
                writeln!(self.out, "{} needs a password: password <text>", selected.ssid)?;
            }
        }
        Ok(())
    }

    fn write_networks(
        &mut self,
        networks: &[NetworkSnapshot],
        connected: Option<&NetworkSnapshot>,
        selected: Option<&NetworkSnapshot>,
    ) -> Result<()> {
        if networks.is_empty() {
            writeln!(self.out, "No networks found.")?;
        }
        if let Some(current) = connected {
            writeln!(self.out, "Connected to {}.", current.ssid)?;
        }
        for (i, network) in networks.iter().enumerate() {
            let selected = selected.is_some_and(|s| s.same_radio(network));
            writeln!(
                self.out,
                "{} {:>2}. {:<24} {:<4} {:>4} dBm  {:<7} {}{}",
                if selected { '*' } else { ' ' },
                i + 1,
                network.ssid,
                "#".repeat(usize::from(network.signal_bars())),
                network.signal_strength,
                network.security.as_str(),
                network.bssid,
                if network.is_current { "  (connected)" } else { "" }
            )?;
        }
        Ok(())
    }
}

enum Input {
    Line(Option<String>),
    SetupChanged(bool),
}

/// Wait for the setup state to change. Returns false once the controller
/// is gone; never resolves without one.
async fn setup_changed(rx: &mut Option<watch::Receiver<WifiSetupState>>) -> bool {
    match rx {
        Some(rx) => rx.changed().await.is_ok(),
        None => std::future::pending().await,
    }
}

fn user_message(err: &Error) -> String {
    match err {
        Error::ValidationFailed(message) => message.clone(),
        other => other.to_string(),
    }
}
