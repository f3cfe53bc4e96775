use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use tokio::sync::watch;
use tracing::warn;

use chefchain_pos::api::{HttpClient, PosApi};
use chefchain_pos::cart::Cart;
use chefchain_pos::checkout::{
    watch_progress, ApprovalSender, CallbackApproval, Checkout, PaymentApproval, TimedApproval,
};
use chefchain_pos::cli::{Cli, Command};
use chefchain_pos::config::{ApprovalMode, Config};
use chefchain_pos::error::{PosError, Result};
use chefchain_pos::history::write_csv;
use chefchain_pos::interface::{
    display_cart, display_checkout_state, display_history, display_kitchen_board,
    display_menu_page, display_notice, display_payment_initiation, display_profile,
    display_verification, draft_summary, prompt_category, prompt_credentials, prompt_funding,
    prompt_item, prompt_menu_action, prompt_menu_patch, prompt_order_draft,
    prompt_quantity_delta, prompt_registration, prompt_search, prompt_yes_no, MenuAction,
};
use chefchain_pos::kitchen::{advance_order, KitchenBoard, KitchenPoller, PollEvent, StatusFilter};
use chefchain_pos::logging::setup_tracing;
use chefchain_pos::models::{
    page_count, Category, MenuItem, MenuItemPatch, MenuQuery, OrderDraft,
};
use chefchain_pos::payments::{fund_wallet, verify_payment};
use chefchain_pos::pricing::{format_amount, ITEMS_PER_PAGE};
use chefchain_pos::session::{self, Session, SessionStore};

#[tokio::main]
async fn main() {
    setup_tracing();
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

struct Context {
    config: Config,
    store: SessionStore,
    session: Session,
}

impl Context {
    /// Client without credentials, for the token endpoints.
    fn anonymous_client(&self) -> Result<HttpClient> {
        HttpClient::new(&self.config.api_base_url, self.config.request_timeout)
    }

    fn client(&self) -> Result<HttpClient> {
        HttpClient::from_config(&self.config, &self.session)
    }

    fn authed_client(&self) -> Result<HttpClient> {
        if !self.session.is_authenticated() {
            return Err(PosError::NotLoggedIn);
        }
        self.client()
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load()?;
    if let Some(url) = cli.api_url {
        config.api_base_url = url.trim().trim_end_matches('/').to_string();
    }

    let store = SessionStore::new(&cli.session);
    let session = store.load()?;
    let ctx = Context {
        config,
        store,
        session,
    };

    let result = dispatch(&ctx, cli.command.unwrap_or_default()).await;
    if let Err(PosError::Auth(_)) = &result {
        session::force_logout(&ctx.store)?;
        eprintln!("Session ended. Run `chefchain login` to sign in again.");
    }
    result
}

async fn dispatch(ctx: &Context, command: Command) -> Result<()> {
    match command {
        Command::Login => cmd_login(ctx).await,
        Command::Register => cmd_register(ctx).await,
        Command::Logout => cmd_logout(ctx).await,
        Command::Whoami => cmd_whoami(ctx).await,
        Command::Refresh => cmd_refresh(ctx).await,
        Command::Menu {
            category,
            search,
            available,
            page,
        } => {
            let query = MenuQuery {
                category,
                search: search.filter(|s| !s.trim().is_empty()),
                available_only: available,
            };
            cmd_menu(ctx, &query, page).await
        }
        Command::Order => cmd_order(ctx).await,
        Command::Kitchen {
            status,
            search,
            once,
        } => cmd_kitchen(ctx, &status, &search, once).await,
        Command::Advance { order_id } => cmd_advance(ctx, order_id).await,
        Command::History { csv } => cmd_history(ctx, csv.as_deref()).await,
        Command::EditItem {
            id,
            price,
            available,
            unavailable,
        } => {
            let availability = match (available, unavailable) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            cmd_edit_item(ctx, id, price, availability).await
        }
        Command::Fund { amount, email } => cmd_fund(ctx, amount, email).await,
        Command::Verify { reference } => cmd_verify(ctx, &reference).await,
    }
}

async fn cmd_login(ctx: &Context) -> Result<()> {
    let credentials = prompt_credentials()?;
    let mut session = session::sign_in(&ctx.anonymous_client()?, &ctx.store, &credentials).await?;

    let api = HttpClient::from_config(&ctx.config, &session)?;
    session::load_profile(&api, &ctx.store, &mut session).await?;
    display_profile(&session);
    Ok(())
}

async fn cmd_register(ctx: &Context) -> Result<()> {
    let request = prompt_registration()?;
    session::register(&ctx.anonymous_client()?, &request).await?;
    println!("Registration successful! Run `chefchain login` to sign in.");
    Ok(())
}

async fn cmd_logout(ctx: &Context) -> Result<()> {
    if !ctx.session.is_authenticated() {
        println!("Not signed in.");
        return Ok(());
    }
    session::sign_out(&ctx.client()?, &ctx.store).await?;
    println!("Signed out.");
    Ok(())
}

async fn cmd_whoami(ctx: &Context) -> Result<()> {
    let api = ctx.authed_client()?;
    let mut session = ctx.session.clone();
    session::load_profile(&api, &ctx.store, &mut session).await?;
    display_profile(&session);
    Ok(())
}

async fn cmd_refresh(ctx: &Context) -> Result<()> {
    session::refresh(&ctx.anonymous_client()?, &ctx.store).await?;
    println!("Access token refreshed.");
    Ok(())
}

async fn cmd_menu(ctx: &Context, query: &MenuQuery, page: usize) -> Result<()> {
    let api = ctx.client()?;
    let categories = api.categories().await?;
    let items = api.menu(query).await?;
    display_menu_page(&items, page.max(1), &categories);
    Ok(())
}

async fn cmd_order(ctx: &Context) -> Result<()> {
    let api = ctx.authed_client()?;
    match ctx.config.approval {
        ApprovalMode::Timer => {
            let approval = TimedApproval::new(ctx.config.approval_wait);
            order_loop(ctx, api, approval, None).await
        }
        ApprovalMode::Callback => {
            let (approval, sender) = CallbackApproval::new(ctx.config.approval_timeout);
            order_loop(ctx, api, approval, Some(sender)).await
        }
    }
}

/// The interactive ordering view: browse, build the cart, place orders.
async fn order_loop<P: PaymentApproval>(
    ctx: &Context,
    api: HttpClient,
    approval: P,
    sender: Option<ApprovalSender>,
) -> Result<()> {
    let query = MenuQuery {
        available_only: true,
        ..MenuQuery::default()
    };
    let mut view = OrderView {
        categories: api.categories().await?,
        items: api.menu(&query).await?,
        query,
        page: 1,
        cart: Cart::new(),
        draft: OrderDraft::default(),
        checkout: Checkout::new(api.clone(), approval)
            .with_tax_rate(ctx.config.tax_rate)
            .with_sync_mode(ctx.config.cart_sync),
        api,
        sender,
    };

    loop {
        view.render();
        match view.step().await {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(err) => display_notice(&err.into_banner()?),
        }
    }
}

struct OrderView<P: PaymentApproval> {
    api: HttpClient,
    categories: Vec<Category>,
    query: MenuQuery,
    items: Vec<MenuItem>,
    page: usize,
    cart: Cart,
    draft: OrderDraft,
    checkout: Checkout<HttpClient, P>,
    sender: Option<ApprovalSender>,
}

impl<P: PaymentApproval> OrderView<P> {
    fn render(&self) {
        display_menu_page(&self.items, self.page, &self.categories);
        display_cart(&self.cart, self.checkout.tax_rate());
        println!("Order: {}", draft_summary(&self.draft));
    }

    /// Run one menu action. `Ok(true)` means the operator is leaving.
    async fn step(&mut self) -> Result<bool> {
        match prompt_menu_action()? {
            MenuAction::AddItem => {
                if let Some(item) = prompt_item(&self.items, "Item to add (name or #id)")? {
                    if item.available {
                        display_notice(&self.cart.add_item(&item).message());
                    } else {
                        display_notice(&format!("{} is currently unavailable", item.name));
                    }
                }
            }
            MenuAction::ChangeQuantity => {
                if let Some(item) = prompt_item(&cart_items(&self.cart), "Cart item")? {
                    let delta = prompt_quantity_delta(&item.name)?;
                    self.cart.update_quantity(item.id, delta);
                }
            }
            MenuAction::RemoveItem => {
                if let Some(item) = prompt_item(&cart_items(&self.cart), "Cart item to remove")? {
                    self.cart.remove_item(item.id);
                    display_notice(&format!("{} removed from cart", item.name));
                }
            }
            MenuAction::NextPage => {
                if self.page < page_count(self.items.len(), ITEMS_PER_PAGE) {
                    self.page += 1;
                }
            }
            MenuAction::PreviousPage => self.page = self.page.saturating_sub(1).max(1),
            MenuAction::FilterCategory => {
                self.query.category = prompt_category(&self.categories)?;
                self.reload_menu().await?;
            }
            MenuAction::Search => {
                self.query.search = prompt_search()?;
                self.reload_menu().await?;
            }
            MenuAction::EditOrder => self.draft = prompt_order_draft(&self.draft)?,
            MenuAction::Checkout => self.place_order().await?,
            MenuAction::ClearCart => {
                if prompt_yes_no("Clear the cart?", false)? {
                    self.cart.clear();
                }
            }
            MenuAction::Quit => {
                return Ok(self.cart.is_empty()
                    || prompt_yes_no("Discard the cart and quit?", false)?);
            }
        }
        Ok(false)
    }

    /// A failed reload keeps the previous listing on screen.
    async fn reload_menu(&mut self) -> Result<()> {
        self.items = self.api.menu(&self.query).await?;
        self.page = 1;
        Ok(())
    }

    /// Submit the cart and show the outcome. Only auth failures propagate;
    /// anything else stays on screen so the operator can fix it and retry.
    async fn place_order(&mut self) -> Result<()> {
        let amount = self.cart.totals(self.checkout.tax_rate()).total;
        let confirm = self.sender.clone().map(|sender| {
            let prompt = format!(
                "Has the customer approved {} on their phone?",
                format_amount(amount)
            );
            (sender, move || prompt_yes_no(&prompt, true).unwrap_or(false))
        });
        let (done_tx, done_rx) = watch::channel(false);
        let progress = watch_progress(
            self.checkout.subscribe(),
            done_rx,
            display_checkout_state,
            confirm,
        );

        let result = self.checkout.submit(&mut self.cart, &mut self.draft).await;
        done_tx.send_replace(true);
        if let Err(e) = progress.await {
            warn!(error = %e, "Checkout progress display did not stop cleanly");
        }
        display_checkout_state(&self.checkout.state());

        match result {
            Ok(_) => self.checkout.hold_confirmation().await,
            Err(err) if err.is_auth() => return Err(err),
            Err(_) => self.checkout.dismiss_error(),
        }
        Ok(())
    }
}

fn cart_items(cart: &Cart) -> Vec<MenuItem> {
    cart.lines().iter().map(|line| line.item.clone()).collect()
}

async fn cmd_kitchen(ctx: &Context, status: &str, search: &str, once: bool) -> Result<()> {
    let filter: StatusFilter = status.parse().map_err(PosError::InvalidInput)?;
    let api = Arc::new(ctx.authed_client()?);

    if once {
        let board = KitchenBoard::fetch(api.as_ref()).await?;
        display_kitchen_board(&board, filter, search, Utc::now());
        return Ok(());
    }

    let (auth_tx, auth_rx) = watch::channel(true);
    let (stop_tx, stop_rx) = watch::channel(false);
    let (handle, mut events) =
        KitchenPoller::new(api, ctx.config.poll_interval).spawn(auth_rx, stop_rx);
    println!(
        "Refreshing every {}s. Press Ctrl+C to stop.",
        ctx.config.poll_interval.as_secs()
    );

    let outcome = loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(PollEvent::Refreshed(board)) => {
                    display_kitchen_board(&board, filter, search, Utc::now());
                }
                Some(PollEvent::Failed(message)) => display_notice(&message),
                Some(PollEvent::AuthExpired) => {
                    auth_tx.send_replace(false);
                    break Err(PosError::Auth("Session expired".to_string()));
                }
                None => break Ok(()),
            },
            _ = tokio::signal::ctrl_c() => break Ok(()),
        }
    };

    stop_tx.send_replace(true);
    if let Err(e) = handle.await {
        warn!(error = %e, "Kitchen poller did not stop cleanly");
    }
    outcome
}

async fn cmd_advance(ctx: &Context, order_id: u64) -> Result<()> {
    let api = ctx.authed_client()?;
    let board = KitchenBoard::fetch(&api).await?;
    let order = board
        .find(order_id)
        .ok_or_else(|| PosError::Validation(format!("Order #{} not found", order_id)))?;

    let updated = advance_order(&api, order).await?;
    println!("Order #{} is now {}.", updated.id, updated.status);
    Ok(())
}

async fn cmd_history(ctx: &Context, csv: Option<&Path>) -> Result<()> {
    let api = ctx.authed_client()?;
    let orders = api.order_history().await?;
    display_history(&orders, Utc::now());

    if let Some(path) = csv {
        write_csv(&orders, path)?;
        println!("Wrote {} orders to {:?}", orders.len(), path);
    }
    Ok(())
}

async fn cmd_edit_item(
    ctx: &Context,
    id: u64,
    price: Option<String>,
    available: Option<bool>,
) -> Result<()> {
    let api = ctx.authed_client()?;

    let patch = if price.is_some() || available.is_some() {
        if let Some(price) = &price {
            let valid = price.trim().parse::<f64>().map(|p| p >= 0.0).unwrap_or(false);
            if !valid {
                return Err(PosError::InvalidInput(format!("Invalid price '{}'", price)));
            }
        }
        MenuItemPatch {
            price: price.map(|p| p.trim().to_string()),
            available,
            ..MenuItemPatch::default()
        }
    } else {
        let items = api.menu(&MenuQuery::default()).await?;
        let item = items
            .iter()
            .find(|i| i.id == id)
            .ok_or_else(|| PosError::Validation(format!("Menu item #{} not found", id)))?;
        let categories = api.categories().await?;
        prompt_menu_patch(item, &categories)?
    };

    if patch.is_empty() {
        println!("Nothing to change.");
        return Ok(());
    }

    let updated = api.update_menu_item(id, &patch).await?;
    println!(
        "Updated {} ({}, {})",
        updated.name,
        format_amount(updated.price),
        if updated.available { "available" } else { "unavailable" }
    );
    Ok(())
}

async fn cmd_fund(ctx: &Context, amount: Option<String>, email: Option<String>) -> Result<()> {
    let api = ctx.authed_client()?;
    let (amount, email) = prompt_funding(amount, email)?;
    let initiation = fund_wallet(&api, &amount, &email).await?;
    display_payment_initiation(&initiation);
    Ok(())
}

async fn cmd_verify(ctx: &Context, reference: &str) -> Result<()> {
    let api = ctx.authed_client()?;
    let verification = verify_payment(&api, reference).await?;
    display_verification(&verification);
    Ok(())
}
