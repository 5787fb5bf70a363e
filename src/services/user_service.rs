// src/services/user_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        documento::{para_campos, Consulta},
        user::{CadastroForm, LoginForm, NovoUsuario, TipoUsuario, Usuario},
    },
    services::{
        auth_service::{ErroIdentidade, Identidade, IdentityProvider},
        projecao::Projecao,
    },
    store::{colecoes, DocumentStore},
};

pub const MSG_CAMPOS_VAZIOS: &str = "Preencha todos os campos.";

fn algum_vazio(campos: &[&str]) -> bool {
    campos.iter().any(|c| c.trim().is_empty())
}

/// Regista a conta no provedor de identidade e grava `usuarios/{uid}`.
pub async fn registrar_usuario(
    identidade: &dyn IdentityProvider,
    store: &dyn DocumentStore,
    form: &CadastroForm,
) -> AppResult<Identidade> {
    if algum_vazio(&[&form.nome, &form.email, &form.senha]) {
        tracing::warn!("Registo recusado: campos vazios.");
        return Err(AppError::Validacao(MSG_CAMPOS_VAZIOS.to_string()));
    }

    let conta = identidade.cadastrar(&form.email, &form.senha).await?;

    let novo = NovoUsuario {
        nome: form.nome.trim().to_string(),
        email: conta.email.clone(),
        tipo_usuario: form.tipo_usuario(),
        avaliador: false,
    };
    store
        .definir(colecoes::USUARIOS, &conta.uid, para_campos(&novo)?)
        .await?;

    tracing::info!("✅ Utilizador '{}' registado como {}.", conta.uid, novo.tipo_usuario);
    Ok(conta)
}

/// Autentica e devolve a conta e o papel lido de `usuarios`.
pub async fn entrar(
    identidade: &dyn IdentityProvider,
    store: &dyn DocumentStore,
    form: &LoginForm,
) -> AppResult<(Identidade, TipoUsuario)> {
    if algum_vazio(&[&form.email, &form.senha]) {
        return Err(AppError::Validacao(MSG_CAMPOS_VAZIOS.to_string()));
    }

    // No login, qualquer falha do provedor vira "credencial inválida"
    let conta = identidade.entrar(&form.email, &form.senha).await.map_err(|e| {
        tracing::error!("Erro ao fazer login ({}): {}", form.email, e);
        AppError::Identidade(ErroIdentidade::CredencialInvalida)
    })?;

    let tipo = tipo_do_usuario(store, &conta.uid).await?;
    tracing::info!("✅ Login de '{}' ({}).", conta.uid, tipo);
    Ok((conta, tipo))
}

pub async fn buscar_usuario(store: &dyn DocumentStore, uid: &str) -> AppResult<Option<Usuario>> {
    let doc = store.ler(colecoes::USUARIOS, uid).await?;
    Ok(doc.as_ref().map(Usuario::de_documento))
}

/// Papel do utilizador; sem documento ou com papel desconhecido é erro.
pub async fn tipo_do_usuario(store: &dyn DocumentStore, uid: &str) -> AppResult<TipoUsuario> {
    buscar_usuario(store, uid)
        .await?
        .and_then(|u| u.tipo)
        .ok_or_else(|| {
            tracing::warn!("Utilizador '{}' sem dados ou sem papel válido.", uid);
            AppError::DadosUsuarioAusentes(uid.to_string())
        })
}

pub async fn listar_alunos(store: &dyn DocumentStore) -> AppResult<Vec<Usuario>> {
    let consulta =
        Consulta::colecao(colecoes::USUARIOS).onde_igual("tipoUsuario", TipoUsuario::Aluno.as_str());
    let docs = store.consultar(&consulta).await?;
    Ok(docs.iter().map(Usuario::de_documento).collect())
}

/// Utilizadores e a projeção de cursos, temas e projetos para a lista
/// completa. As quatro coleções são lidas em separado.
pub async fn carregar_lista_usuarios(
    store: &dyn DocumentStore,
) -> AppResult<(Vec<Usuario>, Projecao)> {
    let cursos = store.consultar(&Consulta::colecao(colecoes::CURSOS)).await?;
    let temas = store.consultar(&Consulta::colecao(colecoes::TEMAS)).await?;
    let projetos = store.consultar(&Consulta::colecao(colecoes::PROJETOS)).await?;
    let usuarios = store.consultar(&Consulta::colecao(colecoes::USUARIOS)).await?;

    let projecao = Projecao::construir(&cursos, &temas, &projetos);
    let usuarios = usuarios.iter().map(Usuario::de_documento).collect();
    Ok((usuarios, projecao))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db,
        services::auth_service::SqliteIdentityProvider,
        store::SqliteDocumentStore,
    };
    use serde_json::json;

    async fn ambiente() -> (SqliteIdentityProvider, SqliteDocumentStore) {
        let pool = db::create_memory_pool().await.expect("pool");
        (
            SqliteIdentityProvider::com_custo(pool.clone(), 4),
            SqliteDocumentStore::new(pool),
        )
    }

    fn cadastro(nome: &str, email: &str, senha: &str, professor: bool) -> CadastroForm {
        CadastroForm {
            nome: nome.into(),
            email: email.into(),
            senha: senha.into(),
            is_professor: professor.then(|| "on".to_string()),
        }
    }

    #[tokio::test]
    async fn registo_grava_documento_do_usuario() {
        let (idp, store) = ambiente().await;
        let conta = registrar_usuario(&idp, &store, &cadastro("Rafael", "rafa@x.com", "segredo1", true))
            .await
            .unwrap();

        let doc = store.ler(colecoes::USUARIOS, &conta.uid).await.unwrap().unwrap();
        assert_eq!(doc.campo("tipoUsuario"), Some(&json!("professor")));
        assert_eq!(doc.campo("avaliador"), Some(&json!(false)));
        assert_eq!(doc.texto("email"), Some("rafa@x.com"));
    }

    #[tokio::test]
    async fn registo_com_campo_vazio_nao_chega_ao_provedor() {
        let (idp, store) = ambiente().await;
        let erro = registrar_usuario(&idp, &store, &cadastro("  ", "a@x.com", "segredo1", false))
            .await
            .unwrap_err();
        assert_eq!(erro.mensagem_usuario(), MSG_CAMPOS_VAZIOS);
        // A conta não foi criada: o mesmo email ainda regista
        registrar_usuario(&idp, &store, &cadastro("Ana", "a@x.com", "segredo1", false))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn login_devolve_o_papel() {
        let (idp, store) = ambiente().await;
        registrar_usuario(&idp, &store, &cadastro("Ana", "ana@x.com", "segredo1", false))
            .await
            .unwrap();

        let login = LoginForm {
            email: "ana@x.com".into(),
            senha: "segredo1".into(),
        };
        let (_, tipo) = entrar(&idp, &store, &login).await.unwrap();
        assert_eq!(tipo, TipoUsuario::Aluno);
        assert_eq!(tipo.painel(), "/aluno");
    }

    #[tokio::test]
    async fn login_sem_documento_de_usuario() {
        let (idp, store) = ambiente().await;
        idp.cadastrar("solto@x.com", "segredo1").await.unwrap();
        let login = LoginForm {
            email: "solto@x.com".into(),
            senha: "segredo1".into(),
        };
        let erro = entrar(&idp, &store, &login).await.unwrap_err();
        assert_eq!(erro.mensagem_usuario(), "Dados do usuário não encontrados.");
    }

    #[tokio::test]
    async fn login_com_senha_errada() {
        let (idp, store) = ambiente().await;
        registrar_usuario(&idp, &store, &cadastro("Ana", "ana@x.com", "segredo1", false))
            .await
            .unwrap();
        let login = LoginForm {
            email: "ana@x.com".into(),
            senha: "outra-coisa".into(),
        };
        let erro = entrar(&idp, &store, &login).await.unwrap_err();
        assert_eq!(erro.mensagem_usuario(), "Email ou senha incorretos.");
    }

    #[tokio::test]
    async fn lista_de_alunos_exclui_professores() {
        let (idp, store) = ambiente().await;
        registrar_usuario(&idp, &store, &cadastro("Ana", "ana@x.com", "segredo1", false))
            .await
            .unwrap();
        registrar_usuario(&idp, &store, &cadastro("Rafael", "rafa@x.com", "segredo1", true))
            .await
            .unwrap();
        let alunos = listar_alunos(&store).await.unwrap();
        assert_eq!(alunos.len(), 1);
        assert_eq!(alunos[0].nome.as_deref(), Some("Ana"));
    }
}
