use anyhow::Result;
use derive_more::Display;
use inquire::{InquireError, Password, PasswordDisplayMode, Select, Text};
use log::{error, info};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;
use wis::config::Config;
use wis::db::{CatalogDb, UserDb};
use wis::models::Malt;
use wis::seed::Seed;
use wis::services::{LoginOutcome, PasswordChange, UserManager, WhiskeyManager};
use wis::utils::input_validation::{check_age_range, check_region, Verdict};

type MenuExit = Option<()>;
const MENU_EXIT: MenuExit = None;
const MENU_LOOP: MenuExit = Some(());

/// What a menu does after one of its actions failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Report the error and show the menu again
    Retry,
    /// Leave this menu for the one that opened it
    Back,
    /// Leave every menu
    Quit,
}

impl Flow {
    /// Prompt errors that cannot go away end the menus. Esc steps back one
    /// level. Anything else is reported and retried.
    fn after(error: &anyhow::Error) -> Self {
        match error.downcast_ref::<InquireError>() {
            Some(
                InquireError::NotTTY | InquireError::OperationInterrupted | InquireError::IO(_),
            ) => Flow::Quit,
            Some(InquireError::OperationCanceled) => Flow::Back,
            _ => Flow::Retry,
        }
    }
}

/// Esc inside a form returns to the menu that opened it
fn form(result: Result<()>) -> Result<()> {
    match result {
        Err(e) if Flow::after(&e) == Flow::Back => Ok(()),
        other => other,
    }
}

/// A text menu
trait Menu {
    /// Runs the menu once. Returns `None` when the menu is done,
    /// `Some(())` to show it again.
    fn enter(&mut self) -> Result<Option<()>>;

    /// Shows the menu until it is done, reporting errors along the way.
    /// Returns [`Flow::Back`] or [`Flow::Quit`].
    fn enter_loop(&mut self) -> Flow {
        loop {
            match self.enter() {
                Ok(Some(())) => {}
                Ok(None) => return Flow::Back,
                Err(e) => match Flow::after(&e) {
                    Flow::Retry => {
                        error!("{e:#}");
                        eprintln!("Error: {e}");
                    }
                    flow => {
                        info!("Leaving menu: {e}");
                        return flow;
                    }
                },
            }
        }
    }
}

fn prompt_text(message: &str) -> Result<String> {
    Ok(Text::new(message).prompt()?.trim().to_owned())
}

fn prompt_password(message: &str) -> Result<String> {
    let password = Password::new(message)
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()?;
    Ok(password.trim().to_owned())
}

pub struct App {
    users: UserManager,
    whiskies: WhiskeyManager,
    seed: Option<Seed>,
    quit: bool,
}

impl App {
    pub fn new(users: UserManager, whiskies: WhiskeyManager, seed: Option<Seed>) -> Self {
        App {
            users,
            whiskies,
            seed,
            quit: false,
        }
    }

    pub fn start(&mut self) -> Result<()> {
        self.users.connect()?;
        self.whiskies.connect()?;
        self.users.db().create_tables()?;
        self.whiskies.db().create_tables()?;
        if let Some(seed) = &self.seed {
            seed.apply(self.whiskies.db(), self.users.db())?;
        }

        println!("Whiskey Information System");
        self.enter_loop();

        let users = self.users.disconnect();
        let whiskies = self.whiskies.disconnect();
        users?;
        whiskies?;
        Ok(())
    }

    fn login(&mut self) -> Result<()> {
        let username = prompt_text("Username:")?;
        let password = prompt_password("Password:")?;

        match self.users.login(&username, &password)? {
            LoginOutcome::Rejected(reason) => println!("{reason}"),
            LoginOutcome::MustChangePassword => {
                println!("Please change your default password");
                change_password(&self.users)?;
            }
            LoginOutcome::Granted => {
                println!("[*] Welcome, {username}.");
                let mut menu = QueryMenu {
                    whiskies: &mut self.whiskies,
                    quit: false,
                };
                let flow = menu.enter_loop();
                self.quit = menu.quit || flow == Flow::Quit;
            }
        }
        Ok(())
    }
}

impl Menu for App {
    fn enter(&mut self) -> Result<MenuExit> {
        #[derive(EnumIter, Display)]
        enum Choice {
            #[display("Log in")]
            Login,
            #[display("Change password")]
            ChangePassword,
            #[display("Exit")]
            Exit,
        }

        if self.quit {
            return Ok(MENU_EXIT);
        }

        let choice = Select::new("What do you want to do?", Choice::iter().collect()).prompt()?;

        match choice {
            Choice::Login => form(self.login())?,
            Choice::ChangePassword => form(change_password(&self.users))?,
            Choice::Exit => return Ok(MENU_EXIT),
        }
        Ok(if self.quit { MENU_EXIT } else { MENU_LOOP })
    }
}

/// The password change form
fn change_password(users: &UserManager) -> Result<()> {
    let username = prompt_text("Username:")?;
    let old_password = prompt_password("Current password:")?;
    let new_password = prompt_password("New password:")?;

    match users.change_password(&username, &old_password, &new_password)? {
        PasswordChange::Changed => println!("Password changed successfully"),
        PasswordChange::NotUpdated => println!("Failed to update password"),
        PasswordChange::Rejected(reason) => println!("{reason}"),
    }
    Ok(())
}

fn show(malt: Option<&Malt>) {
    if let Some(Malt {
        distillery,
        age,
        region,
        price,
    }) = malt
    {
        println!("Distillery: {distillery}\nAge: {age}\nRegion: {region}\nPrice: {price}");
    }
}

struct QueryMenu<'srv> {
    whiskies: &'srv mut WhiskeyManager,
    quit: bool,
}

impl QueryMenu<'_> {
    fn after_query(&mut self, count: usize) {
        if count == 0 {
            println!("No records found");
        } else {
            println!("Found {count} records");
            show(self.whiskies.first());
        }
    }

    fn region_query(&mut self) -> Result<()> {
        let region = prompt_text("Region:")?;
        if let Verdict::Rejected(reason) = check_region(region.as_str()) {
            println!("{reason}");
            return Ok(());
        }
        let count = self.whiskies.find_malts_from_region(&region)?;
        self.after_query(count);
        Ok(())
    }

    fn age_range_query(&mut self) -> Result<()> {
        let lower = prompt_text("Minimum age:")?;
        let upper = prompt_text("Maximum age:")?;
        let verdict = check_age_range(lower.as_str(), upper.as_str());
        let Some(range) = verdict.accepted_range() else {
            println!("{}", verdict.message());
            return Ok(());
        };
        info!("Age range query {range}");
        let count = self.whiskies.find_malts_in_age_range(range.lower, range.upper)?;
        self.after_query(count);
        Ok(())
    }
}

impl Menu for QueryMenu<'_> {
    fn enter(&mut self) -> Result<Option<()>> {
        #[derive(EnumIter, Display)]
        enum Choice {
            #[display("All malts")]
            AllMalts,
            #[display("Malts from region")]
            RegionMalts,
            #[display("Malts in age range")]
            AgeRangeMalts,
            #[display("Next")]
            Next,
            #[display("Previous")]
            Previous,
            #[display("Clear")]
            Clear,
            #[display("Log out")]
            Logout,
            #[display("Exit")]
            Exit,
        }

        let browsing = self.whiskies.record_count() > 0;
        let choices = Choice::iter()
            .filter(|c| browsing || !matches!(c, Choice::Next | Choice::Previous))
            .collect();

        let choice = Select::new("Query:", choices).prompt()?;
        match choice {
            Choice::AllMalts => {
                let count = self.whiskies.find_all_malts()?;
                self.after_query(count);
            }

            Choice::RegionMalts => form(self.region_query())?,
            Choice::AgeRangeMalts => form(self.age_range_query())?,

            Choice::Next => show(self.whiskies.next()),
            Choice::Previous => show(self.whiskies.previous()),
            Choice::Clear => self.whiskies.clear(),
            Choice::Logout => return Ok(MENU_EXIT),
            Choice::Exit => {
                self.quit = true;
                return Ok(MENU_EXIT);
            }
        }
        Ok(MENU_LOOP)
    }
}

fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    simple_logging::log_to_file(&config.log_file, config.level_filter()?)?;
    match &config.source {
        Some(path) => info!("Configuration read from {}", path.display()),
        None => info!("No configuration file, using defaults"),
    }

    let users = UserManager::new(UserDb::new(&config.users_db));
    let whiskies = WhiskeyManager::new(CatalogDb::new(&config.catalog_db));
    let seed = config.seed_file.as_deref().map(Seed::load).transpose()?;
    App::new(users, whiskies, seed).start()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;

    /// Replays canned results, one per call to `enter`
    struct Scripted {
        script: VecDeque<Result<MenuExit>>,
        calls: usize,
    }

    impl Scripted {
        fn new(script: Vec<Result<MenuExit>>) -> Self {
            Self {
                script: script.into(),
                calls: 0,
            }
        }
    }

    impl Menu for Scripted {
        fn enter(&mut self) -> Result<MenuExit> {
            self.calls += 1;
            self.script
                .pop_front()
                .unwrap_or_else(|| panic!("menu shown {} times", self.calls))
        }
    }

    #[test]
    fn test_flow_after_error() {
        let flow = |e: InquireError| Flow::after(&anyhow::Error::from(e));

        assert_eq!(flow(InquireError::NotTTY), Flow::Quit);
        assert_eq!(flow(InquireError::OperationInterrupted), Flow::Quit);
        assert_eq!(
            flow(InquireError::IO(io::Error::from(io::ErrorKind::UnexpectedEof))),
            Flow::Quit
        );
        assert_eq!(flow(InquireError::OperationCanceled), Flow::Back);
        assert_eq!(Flow::after(&anyhow::anyhow!("database is locked")), Flow::Retry);
    }

    #[test]
    fn test_no_terminal_ends_loop() {
        let mut menu = Scripted::new(vec![Err(InquireError::NotTTY.into())]);
        assert_eq!(menu.enter_loop(), Flow::Quit);
        assert_eq!(menu.calls, 1);
    }

    #[test]
    fn test_escape_goes_back() {
        let mut menu = Scripted::new(vec![
            Ok(MENU_LOOP),
            Err(InquireError::OperationCanceled.into()),
        ]);
        assert_eq!(menu.enter_loop(), Flow::Back);
        assert_eq!(menu.calls, 2);
    }

    #[test]
    fn test_other_errors_show_menu_again() {
        let mut menu = Scripted::new(vec![
            Err(anyhow::anyhow!("database is locked")),
            Ok(MENU_LOOP),
            Ok(MENU_EXIT),
        ]);
        assert_eq!(menu.enter_loop(), Flow::Back);
        assert_eq!(menu.calls, 3);
    }

    #[test]
    fn test_escape_in_form_stays_in_menu() {
        assert!(form(Err(InquireError::OperationCanceled.into())).is_ok());
        assert!(form(Ok(())).is_ok());

        let quit = form(Err(InquireError::OperationInterrupted.into())).unwrap_err();
        assert_eq!(Flow::after(&quit), Flow::Quit);
    }
}
