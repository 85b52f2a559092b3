use bpmn_narrator::render;

fn wrap(process_xml: &str) -> Vec<u8> {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<definitions xmlns="http://www.omg.org/spec/BPMN/20100524/MODEL">
{process_xml}
</definitions>"#
    )
    .into_bytes()
}

#[test]
fn linear_three_step_process() {
    let xml = wrap(
        r#"
        <process id="P1" name="Pedido">
          <laneSet>
            <lane id="l1" name="Vendas">
              <flowNodeRef>t1</flowNodeRef>
            </lane>
          </laneSet>
          <startEvent id="s1" name="Início" />
          <userTask id="t1" name="A" />
          <endEvent id="e1" name="Fim" />
          <sequenceFlow id="f1" sourceRef="s1" targetRef="t1" />
          <sequenceFlow id="f2" sourceRef="t1" targetRef="e1" />
        </process>"#,
    );
    let out = render(&xml, "pedido").unwrap();
    assert!(out.starts_with("Titulo: Pedido"));
    assert!(out.contains("1. Evento de início: Início"));
    assert!(out.contains("2. Atividade: A"));
    assert!(out.contains("Ator: Vendas | Tipo: Atividade de Usuário"));
    assert!(out.contains("3. Evento de fim: Fim"));
}

#[test]
fn exclusive_split_labels_branches_by_flow_name() {
    let xml = wrap(
        r#"
        <process id="P1" name="Aprovacao">
          <startEvent id="s1" />
          <exclusiveGateway id="g1" name="Aprovado?" />
          <endEvent id="e1" name="Aceito" />
          <endEvent id="e2" name="Rejeitado" />
          <sequenceFlow id="f1" sourceRef="s1" targetRef="g1" />
          <sequenceFlow id="f2" sourceRef="g1" targetRef="e1" name="Sim" />
          <sequenceFlow id="f3" sourceRef="g1" targetRef="e2" name="Não" />
        </process>"#,
    );
    let out = render(&xml, "aprovacao").unwrap();
    assert!(out.contains("2. Gateway exclusivo: Aprovado?"));
    assert!(out.contains("Caso Sim:"));
    assert!(out.contains("Caso Não:"));
    assert!(out.contains("2.1.1. Evento de fim: Aceito"));
    assert!(out.contains("2.2.1. Evento de fim: Rejeitado"));
}

#[test]
fn parallel_fork_and_join_reports_convergence() {
    let xml = wrap(
        r#"
        <process id="P1" name="Producao">
          <startEvent id="s1" />
          <parallelGateway id="g1" />
          <task id="a" name="A" />
          <task id="b" name="B" />
          <parallelGateway id="g2" />
          <endEvent id="e1" />
          <sequenceFlow id="f1" sourceRef="s1" targetRef="g1" />
          <sequenceFlow id="f2" sourceRef="g1" targetRef="a" />
          <sequenceFlow id="f3" sourceRef="g1" targetRef="b" />
          <sequenceFlow id="f4" sourceRef="a" targetRef="g2" />
          <sequenceFlow id="f5" sourceRef="b" targetRef="g2" />
          <sequenceFlow id="f6" sourceRef="g2" targetRef="e1" />
        </process>"#,
    );
    let out = render(&xml, "producao").unwrap();
    assert!(out.contains("Fim do Gateway Paralelo (convergência)"));
    assert!(out.contains("Caminho 01"));
    assert!(out.contains("Caminho 02"));
}

#[test]
fn loop_back_into_committed_node_emits_cross_reference() {
    let xml = wrap(
        r#"
        <process id="P1" name="Retrabalho">
          <startEvent id="s1" />
          <task id="t1" name="Revisar" />
          <exclusiveGateway id="g1" name="Ok?" />
          <endEvent id="e1" />
          <sequenceFlow id="f1" sourceRef="s1" targetRef="t1" />
          <sequenceFlow id="f2" sourceRef="t1" targetRef="g1" />
          <sequenceFlow id="f3" sourceRef="g1" targetRef="t1" name="repetir" />
          <sequenceFlow id="f4" sourceRef="g1" targetRef="e1" name="seguir" />
        </process>"#,
    );
    let out = render(&xml, "retrabalho").unwrap();
    assert!(out.contains("retorna para 2") || out.contains("loop em 2"));
}

#[test]
fn link_event_pair_is_wired_and_labelled() {
    let xml = wrap(
        r#"
        <process id="P1" name="Encaminhamento">
          <startEvent id="s1" />
          <task id="t1" name="Preparar" />
          <intermediateThrowEvent id="th1"><linkEventDefinition name="Continuar" /></intermediateThrowEvent>
          <intermediateCatchEvent id="ca1"><linkEventDefinition name="Continuar" /></intermediateCatchEvent>
          <task id="t2" name="Finalizar" />
          <endEvent id="e1" />
          <sequenceFlow id="f1" sourceRef="s1" targetRef="t1" />
          <sequenceFlow id="f2" sourceRef="t1" targetRef="th1" />
          <sequenceFlow id="f3" sourceRef="ca1" targetRef="t2" />
          <sequenceFlow id="f4" sourceRef="t2" targetRef="e1" />
        </process>"#,
    );
    let out = render(&xml, "encaminhamento").unwrap();
    assert!(out.contains("(link, disparo)"));
    assert!(out.contains("(link, captura)"));
    assert!(out.contains("Finalizar"));
}

#[test]
fn orphan_annotation_is_reported_separately() {
    let xml = wrap(
        r#"
        <process id="P1" name="Consulta">
          <startEvent id="s1" />
          <endEvent id="e1" />
          <sequenceFlow id="f1" sourceRef="s1" targetRef="e1" />
          <textAnnotation id="ta1"><text>Revisar depois com o time</text></textAnnotation>
        </process>"#,
    );
    let out = render(&xml, "consulta").unwrap();
    assert!(out.contains("Anotações não ligadas a elementos:"));
    assert!(out.contains("\"Revisar depois com o time\""));
}

#[test]
fn message_flow_between_two_pools_is_reported() {
    let xml = wrap(
        r#"
        <collaboration id="c1">
          <participant id="p1" name="Cliente" processRef="P1" />
          <participant id="p2" name="Loja" processRef="P2" />
          <messageFlow id="mf1" sourceRef="s1" targetRef="s2" name="Pedido enviado" />
        </collaboration>
        <process id="P1" name="Fluxo do Cliente">
          <startEvent id="s1" name="Enviar pedido" />
        </process>
        <process id="P2" name="Fluxo da Loja">
          <startEvent id="s2" name="Receber pedido" />
        </process>"#,
    );
    let out = render(&xml, "pedido").unwrap();
    assert!(out.contains("Interações entre processos (message flows):"));
    assert!(out.contains("Cliente / Enviar pedido | Loja / Receber pedido | Pedido enviado"));
}

#[test]
fn missing_process_is_an_error() {
    let xml = wrap("");
    assert!(render(&xml, "vazio").is_err());
}
