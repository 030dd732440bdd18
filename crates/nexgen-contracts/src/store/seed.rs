use crate::models::timestamp::now_utc;
use crate::models::{ProjectIdea, User, UserRole};

fn seed_user(id: &str, name: &str, email: &str, password: &str, role: UserRole) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        role,
        password: Some(password.to_string()),
        phone: None,
        avatar: None,
    }
}

/// Demo accounts merged into the users collection on every `init`.
pub fn seed_users() -> Vec<User> {
    vec![
        seed_user("admin-1", "Admin Principal", "admin@nexgen.com", "123", UserRole::Admin),
        seed_user("admin-2", "Admin Parma", "parma@gmail.com", "123", UserRole::Admin),
        seed_user("admin-3", "Mateus Admin", "mateus@admin.com", "1234", UserRole::Admin),
        seed_user("client-1", "João Silva", "joao@cliente.com", "123", UserRole::Client),
    ]
}

pub fn seed_projects() -> Vec<ProjectIdea> {
    vec![ProjectIdea {
        id: "1".to_string(),
        owner_id: Some("client-1".to_string()),
        title: "E-commerce de Vinhos".to_string(),
        description: "Plataforma para vender vinhos portugueses para a China. Preciso de integração com WeChat Pay e sistema de logística automatizado.".to_string(),
        features: vec![
            "Pagamento WeChat".to_string(),
            "Tradução Mandarim".to_string(),
            "Cálculo de Frete".to_string(),
        ],
        budget_range: Some("€5.000 - €10.000".to_string()),
        created_at: now_utc(),
        images: vec![
            "https://images.unsplash.com/photo-1506377247377-2a5b3b417ebb?auto=format&fit=crop&q=80&w=800".to_string(),
        ],
        drive_link: Some("https://drive.google.com/drive/folders/exemple".to_string()),
    }]
}
