//! Interactive terminal client.
//!
//! Each screen issues exactly one request per submit and reports the outcome
//! on a status line; a failure simply redisplays the menu with the localized
//! error message.

use std::io::{self, BufRead, Write};

use crate::client::session::ClientSession;
use crate::client::ClientConfig;
use crate::users::dto::{CreateUserRequest, ProfileUpdateRequest, PublicUser};

fn prompt(label: &str) -> io::Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn optional(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn print_users(users: &[PublicUser]) {
    println!("{:<6} {:<24} {:<30} {:<16}", "id", "name", "email", "phone");
    for u in users {
        println!(
            "{:<6} {:<24} {:<30} {:<16}",
            u.id,
            u.name,
            u.email,
            u.phone.as_deref().unwrap_or("-")
        );
    }
}

pub async fn run(config: ClientConfig) -> anyhow::Result<()> {
    let mut session = ClientSession::new(&config)?;
    println!("userdesk console — {}", config.base_url);

    loop {
        if session.is_authenticated() {
            if !dashboard_screen(&mut session).await? {
                break;
            }
        } else if !entry_screen(&mut session).await? {
            break;
        }
    }
    Ok(())
}

/// Login / registration screen, shown while logged out.
async fn entry_screen(session: &mut ClientSession) -> anyhow::Result<bool> {
    println!();
    println!("[1] Вход  [2] Регистрация  [0] Выход");
    match prompt(">")?.as_str() {
        "1" => {
            let email = prompt("Email")?;
            let password = prompt("Пароль")?;
            if email.is_empty() || password.is_empty() {
                println!("Email и пароль обязательны");
                return Ok(true);
            }
            match session.login(&email, &password).await {
                Ok(user) => println!("Добро пожаловать, {}", user.name),
                Err(e) => println!("Ошибка: {e}"),
            }
        }
        "2" => {
            let req = CreateUserRequest {
                name: prompt("Имя")?,
                email: prompt("Email")?,
                password: prompt("Пароль")?,
                phone: optional(prompt("Телефон (необязательно)")?),
            };
            match session.register(&req).await {
                Ok(user) => println!("Пользователь {} создан (id {})", user.name, user.id),
                Err(e) => println!("Ошибка: {e}"),
            }
        }
        "0" => return Ok(false),
        _ => {}
    }
    Ok(true)
}

/// Main screen, shown while logged in.
async fn dashboard_screen(session: &mut ClientSession) -> anyhow::Result<bool> {
    println!();
    if let Some(user) = session.current_user() {
        let remaining = session
            .time_remaining()
            .map(|d| format!("{} мин", d.as_secs() / 60))
            .unwrap_or_else(|| "-".into());
        println!("Вы вошли как {} <{}> (сессия: {})", user.name, user.email, remaining);
    }
    print!("[1] Пользователи  [2] Обновить список  [3] Профиль  [4] Смена пароля  ");
    if session.is_admin() {
        print!("[5] Админ-панель  ");
    }
    println!("[6] Выйти из аккаунта  [0] Выход");

    match prompt(">")?.as_str() {
        "1" => list_screen(session, false).await,
        "2" => list_screen(session, true).await,
        "3" => profile_screen(session).await,
        "4" => password_screen(session).await,
        "5" if session.is_admin() => admin_screen(session).await,
        "6" => {
            session.logout();
            println!("Вы вышли из аккаунта");
            Ok(())
        }
        "0" => return Ok(false),
        _ => Ok(()),
    }?;
    Ok(true)
}

async fn list_screen(session: &mut ClientSession, force: bool) -> anyhow::Result<()> {
    println!("Загрузка списка пользователей...");
    match session.users(force).await {
        Ok(listing) => {
            print_users(&listing.users);
            if let Some(warning) = listing.stale_warning {
                println!("! {warning}");
            }
        }
        Err(e) => println!("Ошибка: {e}"),
    }
    Ok(())
}

async fn profile_screen(session: &mut ClientSession) -> anyhow::Result<()> {
    println!("Пустое поле оставляет значение без изменений.");
    let req = ProfileUpdateRequest {
        name: optional(prompt("Имя")?),
        email: optional(prompt("Email")?),
        phone: optional(prompt("Телефон")?),
    };
    println!("Сохранение профиля...");
    match session.update_profile(&req).await {
        Ok(user) => println!("Профиль обновлён: {} <{}>", user.name, user.email),
        Err(e) => println!("Ошибка: {e}"),
    }
    Ok(())
}

async fn password_screen(session: &mut ClientSession) -> anyhow::Result<()> {
    let new_password = prompt("Новый пароль")?;
    let repeat = prompt("Повторите пароль")?;
    println!("Смена пароля...");
    match session.change_password(&new_password, &repeat).await {
        Ok(()) => println!("Пароль успешно изменён"),
        Err(e) => println!("Ошибка: {e}"),
    }
    Ok(())
}

async fn admin_screen(session: &mut ClientSession) -> anyhow::Result<()> {
    list_screen(session, false).await?;
    println!("[1] Удалить пользователя  [2] Сбросить пароль  [0] Назад");
    match prompt(">")?.as_str() {
        "1" => {
            let id: i64 = match prompt("ID пользователя")?.parse() {
                Ok(id) => id,
                Err(_) => {
                    println!("Некорректный ID");
                    return Ok(());
                }
            };
            println!("Удаление пользователя {id}...");
            match session.admin_delete_user(id).await {
                Ok(()) => println!("Пользователь удалён"),
                Err(e) => println!("Ошибка: {e}"),
            }
        }
        "2" => {
            let id: i64 = match prompt("ID пользователя")?.parse() {
                Ok(id) => id,
                Err(_) => {
                    println!("Некорректный ID");
                    return Ok(());
                }
            };
            let new_password = prompt("Новый пароль")?;
            println!("Сброс пароля пользователя {id}...");
            match session.admin_change_user_password(id, &new_password).await {
                Ok(()) => println!("Пароль пользователя успешно изменён"),
                Err(e) => println!("Ошибка: {e}"),
            }
        }
        _ => {}
    }
    Ok(())
}
